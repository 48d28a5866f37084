//! End-to-end pipeline test: fetch -> infer -> extract -> aggregate ->
//! consolidate, with a canned reader standing in for the BERT model.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use morbyx_common::{Article, MorbyxError, Result as CommonResult};
use morbyx_graph::{ArticleFetcher, ArticleStore};
use morbyx_qa::{QaConfig, ReaderModel, Result as QaResult, RiskFactorExtractor, TokenScores};

/// In-memory article store; ids in `broken` always fail.
struct MemoryStore {
    articles: HashMap<String, String>,
    broken: Vec<String>,
    calls: AtomicU32,
}

impl MemoryStore {
    fn new(articles: &[(&str, &str)], broken: &[&str]) -> Self {
        Self {
            articles: articles
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .collect(),
            broken: broken.iter().map(|s| s.to_string()).collect(),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn article(&self, id: &str) -> CommonResult<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.iter().any(|b| b == id) {
            return Err(MorbyxError::Graph("upstream unavailable".to_string()));
        }
        self.articles
            .get(id)
            .map(|text| Article { id: id.to_string(), text: text.clone() })
            .ok_or_else(|| MorbyxError::ArticleNotFound(id.to_string()))
    }
}

/// Reader that "finds" configured phrases: whitespace tokens, a leading
/// question token without an offset, and high start/end logits on the
/// phrase boundaries.
struct PhraseReader {
    /// context text -> (phrase, start logit, end logit)
    spans: HashMap<String, Vec<(String, f32, f32)>>,
}

impl PhraseReader {
    fn new(spans: &[(&str, &[(&str, f32, f32)])]) -> Self {
        Self {
            spans: spans
                .iter()
                .map(|(context, phrases)| {
                    (
                        context.to_string(),
                        phrases
                            .iter()
                            .map(|(p, s, e)| (p.to_string(), *s, *e))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ReaderModel for PhraseReader {
    async fn infer(&self, _question: &str, context: &str) -> QaResult<TokenScores> {
        // One token per whitespace-separated word, plus a question token.
        let mut offsets: Vec<Option<(usize, usize)>> = vec![None];
        let mut cursor = 0usize;
        for word in context.split_whitespace() {
            let start = context[cursor..].find(word).unwrap() + cursor;
            offsets.push(Some((start, start + word.len())));
            cursor = start + word.len();
        }

        let mut start_logits = vec![-10.0f32; offsets.len()];
        let mut end_logits = vec![-10.0f32; offsets.len()];

        for (phrase, start_logit, end_logit) in
            self.spans.get(context).map(|v| v.as_slice()).unwrap_or(&[])
        {
            let phrase_start = context.find(phrase.as_str()).expect("phrase in context");
            let phrase_end = phrase_start + phrase.len();
            for (i, span) in offsets.iter().enumerate() {
                if let Some((s, e)) = span {
                    if *s == phrase_start {
                        start_logits[i] = *start_logit;
                    }
                    if *e == phrase_end {
                        end_logits[i] = *end_logit;
                    }
                }
            }
        }

        Ok(TokenScores { start_logits, end_logits, offsets })
    }
}

fn extractor(
    store: MemoryStore,
    reader: PhraseReader,
) -> RiskFactorExtractor<MemoryStore, PhraseReader> {
    RiskFactorExtractor::new(
        ArticleFetcher::with_policy(store, 3, Duration::ZERO),
        reader,
        QaConfig::default().with_max_answer_length(60),
    )
}

#[tokio::test]
async fn test_answers_merge_across_articles() {
    let store = MemoryStore::new(
        &[
            ("art1", "Hypertension is the leading risk factor."),
            ("art2", "Studies confirm hypertension as a risk factor."),
        ],
        &[],
    );
    let reader = PhraseReader::new(&[
        ("Hypertension is the leading risk factor.", &[("Hypertension", 3.0, 2.0)]),
        ("Studies confirm hypertension as a risk factor.", &[("hypertension", 1.5, 1.0)]),
    ]);

    let ranked = extractor(store, reader)
        .evaluate(
            "What are the risk factors of stroke?",
            &["art1".to_string(), "art2".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].text, "hypertension");
    assert_eq!(ranked[0].score, 5.0);
    assert_eq!(ranked[0].article_ids.len(), 2);
}

#[tokio::test]
async fn test_failed_article_does_not_abort_batch() {
    let store = MemoryStore::new(
        &[("art1", "Obesity raises risk."), ("art2", "Smoking raises risk.")],
        &["art-broken"],
    );
    let reader = PhraseReader::new(&[
        ("Obesity raises risk.", &[("Obesity", 4.0, 4.0)]),
        ("Smoking raises risk.", &[("Smoking", 3.5, 3.5)]),
    ]);

    let pipeline = extractor(store, reader);
    let ranked = pipeline
        .evaluate(
            "What are the risk factors of heart disease?",
            &[
                "art1".to_string(),
                "art-broken".to_string(),
                "art2".to_string(),
            ],
        )
        .await
        .unwrap();

    let texts: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["obesity", "smoking"]);
}

#[tokio::test]
async fn test_no_answers_is_empty_not_error() {
    let store = MemoryStore::new(&[("art1", "Nothing relevant here.")], &[]);
    // No phrases configured: all logits stay at the -10.0 baseline and the
    // candidate scores fall below the 1.0 floor.
    let reader = PhraseReader::new(&[]);

    let ranked = extractor(store, reader)
        .evaluate("What are the risk factors of gout?", &["art1".to_string()])
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn test_containment_resolution_end_to_end() {
    let context = "Severe obesity and smoking drive risk.";
    let store = MemoryStore::new(&[("art1", context)], &[]);
    let reader = PhraseReader::new(&[(
        context,
        &[("Severe obesity", 3.0, 3.0), ("obesity", 2.5, 2.5)],
    )]);

    let ranked = extractor(store, reader)
        .evaluate(
            "What are the risk factors of diabetes?",
            &["art1".to_string()],
        )
        .await
        .unwrap();

    // "severe obesity" (5.5) subsumes the contained "obesity" (5.0).
    assert_eq!(ranked[0].text, "severe obesity");
    assert!(ranked.iter().all(|r| r.text != "obesity"));
}
