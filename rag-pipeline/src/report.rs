use futures::future::try_join_all;
use tracing::info;

use common::error::AppError;

use crate::engine::RagEngine;

/// One topic's generated analysis, captured verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResult {
    pub topic: String,
    pub text: String,
}

/// Ordered sequence of topic results, one per requested topic, in the order
/// the topics were requested.
#[derive(Debug, Default)]
pub struct Report {
    results: Vec<TopicResult>,
}

impl Report {
    pub fn results(&self) -> &[TopicResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TopicResult> {
        self.results
    }

    /// Plain-text rendering handed back over the HTTP boundary.
    pub fn render_text(&self) -> String {
        self.results
            .iter()
            .map(|result| result.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Splits the comma-delimited rule field into an ordered topic list.
/// Entries are trimmed but empty entries are kept: they reach the engine as
/// invalid topics and fail the batch, instead of being silently dropped.
pub fn parse_topics(rule: &str) -> Vec<String> {
    rule.split(',').map(|topic| topic.trim().to_string()).collect()
}

/// Runs the engine once per topic, all topics concurrently, and assembles
/// the report in input order.
///
/// Aggregation is all-or-nothing: the first failing topic fails the whole
/// batch and cancels its in-flight siblings, so no partial report can leak
/// to the caller.
#[tracing::instrument(skip(engine, topics), fields(topic_count = topics.len()))]
pub async fn generate_report(engine: &RagEngine, topics: &[String]) -> Result<Report, AppError> {
    let results = try_join_all(topics.iter().map(|topic| engine.analyse_topic(topic))).await?;
    info!(topics = results.len(), "report assembled");
    Ok(Report { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Generator, Retriever};
    use async_trait::async_trait;
    use common::storage::vector_index::RetrievedChunk;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    struct EmptyRetriever;

    #[async_trait]
    impl Retriever for EmptyRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _take: usize,
        ) -> Result<Vec<RetrievedChunk>, AppError> {
            Ok(Vec::new())
        }
    }

    /// Echoes the topic back, optionally failing for one topic and slowing
    /// down another so completion order differs from input order.
    struct EchoGenerator {
        fail_for_topic: Option<&'static str>,
        slow_topic: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // The line right above the positive-marker line is "{topic}:".
            let lines: Vec<&str> = system_prompt.lines().collect();
            let marker_line = lines
                .iter()
                .position(|line| line.trim_start().starts_with("- (✔)"))
                .unwrap_or(1);
            let topic = lines[marker_line - 1].trim().trim_end_matches(':').to_string();
            if let Some(slow) = self.slow_topic {
                if topic == slow {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
            if let Some(failing) = self.fail_for_topic {
                if topic == failing {
                    return Err(AppError::InternalError("model unavailable".into()));
                }
            }
            Ok(format!("analysis of {topic}"))
        }
    }

    fn engine(generator: EchoGenerator) -> RagEngine {
        RagEngine::new(
            Arc::new(EmptyRetriever),
            Arc::new(EmptyRetriever),
            Arc::new(generator),
            10,
        )
    }

    fn topics(raw: &str) -> Vec<String> {
        parse_topics(raw)
    }

    #[test]
    fn parse_preserves_order_and_empty_entries() {
        assert_eq!(
            parse_topics("Working Hours,Salary"),
            vec!["Working Hours".to_string(), "Salary".to_string()]
        );
        assert_eq!(
            parse_topics("A,,B"),
            vec!["A".to_string(), String::new(), "B".to_string()]
        );
        assert_eq!(parse_topics(""), vec![String::new()]);
    }

    #[tokio::test]
    async fn report_keeps_input_order_regardless_of_completion_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine(EchoGenerator {
            fail_for_topic: None,
            slow_topic: Some("A"),
            calls: Arc::clone(&calls),
        });

        let report = generate_report(&engine, &topics("A,B,C")).await.unwrap();

        let order: Vec<&str> = report
            .results()
            .iter()
            .map(|result| result.topic.as_str())
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(report.results()[0].text, "analysis of A");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn one_failing_topic_fails_the_whole_batch() {
        let engine = engine(EchoGenerator {
            fail_for_topic: Some("B"),
            slow_topic: None,
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let err = generate_report(&engine, &topics("A,B,C")).await.unwrap_err();
        assert!(matches!(err, AppError::Rag { ref topic, .. } if topic == "B"));
    }

    #[tokio::test]
    async fn empty_entry_in_the_rule_list_fails_the_batch() {
        let engine = engine(EchoGenerator {
            fail_for_topic: None,
            slow_topic: None,
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let err = generate_report(&engine, &topics("A,,C")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Rag { ref source, .. } if matches!(**source, AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn report_renders_topic_sections_in_order() {
        let engine = engine(EchoGenerator {
            fail_for_topic: None,
            slow_topic: None,
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let report = generate_report(&engine, &topics("Working Hours,Salary"))
            .await
            .unwrap();
        let rendered = report.render_text();
        let hours = rendered.find("analysis of Working Hours").unwrap();
        let salary = rendered.find("analysis of Salary").unwrap();
        assert!(hours < salary);
    }
}
