//! Simulated chart analysis.
//!
//! There is no model behind this: after a fixed delay the analyst produces
//! the same static report for every capture. The delay runs on a background
//! thread and the result comes back through a channel, so the interaction
//! thread never blocks on it.

use std::sync::mpsc::{Receiver, channel};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSection {
    pub title: &'static str,
    pub body: &'static str,
}

/// The finished analysis of a captured chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub sections: Vec<AnalysisSection>,
}

impl AnalysisReport {
    pub fn chart_analysis() -> Self {
        Self {
            sections: vec![
                AnalysisSection {
                    title: "Price Action",
                    body: "The inverted V-shape indicates a potential price reversal.",
                },
                AnalysisSection {
                    title: "Investment Signal",
                    body: "The inverted V-shape is a reversal signal, suitable for selling or \
                           taking profits, with caution due to the risk of overbought conditions.",
                },
                AnalysisSection {
                    title: "Strategic Recommendations",
                    body: "RSI, MACD, Bollinger Bands, and volume can all help confirm the \
                           validity of the inverted V-shape reversal, assisting investors in \
                           making informed decisions.",
                },
            ],
        }
    }

    pub fn to_markdown(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("### {}\n\n{}\n", s.title, s.body))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Messages from the background analysis task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    Ready(AnalysisReport),
    Failed(String),
}

/// Current state of the analysis view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending,
    Ready(AnalysisReport),
    Error(String),
}

/// Produces the static report after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnalyst {
    delay: Duration,
}

impl SimulatedAnalyst {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn analyze(&self) -> AnalysisReport {
        tokio::time::sleep(self.delay).await;
        AnalysisReport::chart_analysis()
    }

    /// Starts the analysis on a background thread.
    ///
    /// Fire-and-forget: dropping the receiver abandons the result.
    pub fn spawn(&self) -> Receiver<AnalysisEvent> {
        let (tx, rx) = channel();
        let analyst = *self;

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build();

            let event = match runtime {
                Ok(rt) => AnalysisEvent::Ready(rt.block_on(analyst.analyze())),
                Err(e) => AnalysisEvent::Failed(format!("Failed to create async runtime: {}", e)),
            };
            // The view may be gone already.
            let _ = tx.send(event);
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_every_section() {
        let md = AnalysisReport::chart_analysis().to_markdown();
        assert!(md.starts_with("### Price Action"));
        assert!(md.contains("### Investment Signal"));
        assert!(md.contains("### Strategic Recommendations"));
    }

    #[test]
    fn spawned_analysis_delivers_report() {
        let rx = SimulatedAnalyst::new(Duration::from_millis(5)).spawn();
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, AnalysisEvent::Ready(AnalysisReport::chart_analysis()));
    }

    #[tokio::test]
    async fn analyze_waits_then_reports() {
        let report = SimulatedAnalyst::new(Duration::ZERO).analyze().await;
        assert_eq!(report.sections.len(), 3);
    }
}
