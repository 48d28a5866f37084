//! Extractive-QA reader model using Candle.
//!
//! Wraps a BERT encoder with a `qa_outputs` head producing per-token start
//! and end logits. The rest of the pipeline consumes it through the
//! [`ReaderModel`] trait, so tests can substitute deterministic scores.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::sync::Api;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use crate::{QaError, Result};

/// Per-article output of the reader: one start and one end logit per token,
/// plus the offset map back into the context. `offsets[i]` is `None` for
/// tokens outside the context segment (question, special tokens, padding).
#[derive(Debug, Clone)]
pub struct TokenScores {
    pub start_logits: Vec<f32>,
    pub end_logits: Vec<f32>,
    pub offsets: Vec<Option<(usize, usize)>>,
}

/// Scores a (question, context) pair into per-token logits.
#[async_trait]
pub trait ReaderModel: Send + Sync {
    async fn infer(&self, question: &str, context: &str) -> Result<TokenScores>;
}

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Hugging Face model id used when no local directory is given.
    pub model_id: String,
    /// Directory holding a fine-tuned model (config.json, tokenizer files,
    /// weights). Takes precedence over `model_id`.
    pub model_dir: Option<PathBuf>,
    /// Maximum sequence length; the context segment is truncated to fit.
    pub max_length: usize,
    pub use_gpu: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model_id: "dmis-lab/biobert-base-cased-v1.1-squad".to_string(),
            model_dir: None,
            max_length: 384,
            use_gpu: true,
        }
    }
}

impl ReaderConfig {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(dir.into()),
            ..Default::default()
        }
    }
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: Option<PathBuf>,
    vocab: Option<PathBuf>,
    weights: PathBuf,
}

/// BERT QA reader.
pub struct BertReader {
    model: BertModel,
    tokenizer: Tokenizer,
    qa_outputs: Tensor,
    qa_outputs_bias: Tensor,
    device: Device,
}

impl BertReader {
    /// Load the reader from a local directory or the Hugging Face Hub.
    pub async fn new(config: ReaderConfig) -> Result<Self> {
        let start = Instant::now();
        info!(
            "Loading QA reader: {}",
            config
                .model_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| config.model_id.clone())
        );

        let device = if config.use_gpu {
            Device::cuda_if_available(0).unwrap_or(Device::Cpu)
        } else {
            Device::Cpu
        };
        debug!("Using device: {:?}", device);

        let cfg = config.clone();
        let (bert_config, tokenizer, weights_path) = tokio::task::spawn_blocking(move || {
            let files = resolve_files(&cfg)?;
            let bert_config = load_bert_config(&files.config)?;
            let tokenizer = load_tokenizer(&files, cfg.max_length)?;
            Ok::<_, QaError>((bert_config, tokenizer, files.weights))
        })
        .await
        .map_err(|e| QaError::Download(e.to_string()))??;

        let vb = if weights_path.extension().map(|e| e == "safetensors").unwrap_or(false) {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
                    .map_err(|e| QaError::ModelLoad(e.to_string()))?
            }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)
                .map_err(|e| QaError::ModelLoad(e.to_string()))?
        };

        let model = BertModel::load(vb.clone(), &bert_config)
            .or_else(|_| BertModel::load(vb.pp("bert"), &bert_config))
            .map_err(|e| QaError::ModelLoad(format!("BertModel: {}", e)))?;

        let hidden_size = bert_config.hidden_size;
        let qa_outputs = vb
            .pp("qa_outputs")
            .get((2, hidden_size), "weight")
            .or_else(|_| vb.get((2, hidden_size), "qa_outputs.weight"))
            .map_err(|e| QaError::ModelLoad(format!("qa_outputs: {}", e)))?;
        let qa_outputs_bias = vb
            .pp("qa_outputs")
            .get(2, "bias")
            .or_else(|_| vb.get(2, "qa_outputs.bias"))
            .map_err(|e| QaError::ModelLoad(format!("qa_outputs bias: {}", e)))?;

        info!("QA reader loaded in {:?}", start.elapsed());

        Ok(Self {
            model,
            tokenizer,
            qa_outputs,
            qa_outputs_bias,
            device,
        })
    }

    /// Encode a (question, context) pair and score every token.
    fn score_pair(&self, question: &str, context: &str) -> Result<TokenScores> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| QaError::Tokenization(e.to_string()))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        if input_ids.is_empty() {
            return Ok(TokenScores {
                start_logits: Vec::new(),
                end_logits: Vec::new(),
                offsets: Vec::new(),
            });
        }
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&id| id as i64).collect();
        let seq_len = input_ids.len();

        // Offsets are only meaningful inside the context segment.
        let raw_offsets = encoding.get_offsets();
        let offsets: Vec<Option<(usize, usize)>> = encoding
            .get_sequence_ids()
            .iter()
            .zip(raw_offsets.iter())
            .map(|(seq_id, span)| match seq_id {
                Some(1) => Some(*span),
                _ => None,
            })
            .collect();

        let input_ids_tensor = Tensor::new(&input_ids[..], &self.device)?
            .unsqueeze(0)?
            .to_dtype(DType::I64)?;
        let token_type_ids = Tensor::new(&type_ids[..], &self.device)?
            .unsqueeze(0)?
            .to_dtype(DType::I64)?;
        let attention_mask = Tensor::ones((1, seq_len), DType::F32, &self.device)?;

        // [1, seq, hidden]
        let hidden_states =
            self.model
                .forward(&input_ids_tensor, &token_type_ids, Some(&attention_mask))?;
        let (batch, seq, hidden) = hidden_states
            .dims3()
            .map_err(|e| QaError::Inference(e.to_string()))?;
        let hidden_2d = hidden_states.reshape((batch * seq, hidden))?;

        // [seq, 2]: column 0 = start logits, column 1 = end logits
        let logits = hidden_2d
            .matmul(&self.qa_outputs.t()?)?
            .broadcast_add(&self.qa_outputs_bias)?;

        let start_logits = logits.narrow(1, 0, 1)?.squeeze(1)?.to_vec1::<f32>()?;
        let end_logits = logits.narrow(1, 1, 1)?.squeeze(1)?.to_vec1::<f32>()?;

        Ok(TokenScores {
            start_logits,
            end_logits,
            offsets,
        })
    }
}

#[async_trait]
impl ReaderModel for BertReader {
    async fn infer(&self, question: &str, context: &str) -> Result<TokenScores> {
        self.score_pair(question, context)
    }
}

fn resolve_files(config: &ReaderConfig) -> Result<ModelFiles> {
    if let Some(dir) = &config.model_dir {
        let config_path = dir.join("config.json");
        if !config_path.exists() {
            return Err(QaError::ModelLoad(format!(
                "no config.json in {}",
                dir.display()
            )));
        }
        let tokenizer = Some(dir.join("tokenizer.json")).filter(|p| p.exists());
        let vocab = Some(dir.join("vocab.txt")).filter(|p| p.exists());
        let weights = if dir.join("model.safetensors").exists() {
            dir.join("model.safetensors")
        } else {
            dir.join("pytorch_model.bin")
        };
        if !weights.exists() {
            return Err(QaError::ModelLoad(format!(
                "no model weights in {}",
                dir.display()
            )));
        }
        return Ok(ModelFiles {
            config: config_path,
            tokenizer,
            vocab,
            weights,
        });
    }

    use hf_hub::{Repo, RepoType};
    let api = Api::new().map_err(|e| QaError::Download(format!("API init: {}", e)))?;
    let repo = Repo::new(config.model_id.clone(), RepoType::Model);
    let api_repo = api.repo(repo);

    let config_path = api_repo
        .get("config.json")
        .map_err(|e| QaError::Download(format!("config.json: {}", e)))?;
    let tokenizer = api_repo.get("tokenizer.json").ok();
    let vocab = api_repo.get("vocab.txt").ok();
    let weights = api_repo
        .get("model.safetensors")
        .or_else(|_| api_repo.get("pytorch_model.bin"))
        .map_err(|e| QaError::Download(format!("model weights: {}", e)))?;

    Ok(ModelFiles {
        config: config_path,
        tokenizer,
        vocab,
        weights,
    })
}

fn load_bert_config(path: &PathBuf) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| QaError::ModelLoad(format!("parse config: {}", e)))?;

    Ok(Config {
        vocab_size: json["vocab_size"].as_u64().unwrap_or(30522) as usize,
        hidden_size: json["hidden_size"].as_u64().unwrap_or(768) as usize,
        num_hidden_layers: json["num_hidden_layers"].as_u64().unwrap_or(12) as usize,
        num_attention_heads: json["num_attention_heads"].as_u64().unwrap_or(12) as usize,
        intermediate_size: json["intermediate_size"].as_u64().unwrap_or(3072) as usize,
        hidden_act: candle_transformers::models::bert::HiddenAct::Gelu,
        hidden_dropout_prob: 0.1,
        max_position_embeddings: json["max_position_embeddings"].as_u64().unwrap_or(512) as usize,
        type_vocab_size: 2,
        initializer_range: 0.02,
        layer_norm_eps: 1e-12,
        pad_token_id: 0,
        position_embedding_type:
            candle_transformers::models::bert::PositionEmbeddingType::Absolute,
        use_cache: true,
        classifier_dropout: None,
        model_type: Some("bert".to_string()),
    })
}

fn load_tokenizer(files: &ModelFiles, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer = if let Some(path) = &files.tokenizer {
        Tokenizer::from_file(path).map_err(|e| QaError::Tokenization(e.to_string()))?
    } else if let Some(vocab_path) = &files.vocab {
        debug!("Building tokenizer from vocab.txt");
        let vocab_content = std::fs::read_to_string(vocab_path)?;
        let vocab: std::collections::HashMap<String, u32> = vocab_content
            .lines()
            .enumerate()
            .map(|(i, line)| (line.to_string(), i as u32))
            .collect();
        let ahash_vocab: ahash::AHashMap<String, u32> = vocab.into_iter().collect();

        use tokenizers::models::wordpiece::WordPieceBuilder;
        let wordpiece = WordPieceBuilder::new()
            .vocab(ahash_vocab)
            .continuing_subword_prefix("##".to_string())
            .max_input_chars_per_word(100)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| QaError::Tokenization(format!("WordPiece: {}", e)))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        use tokenizers::normalizers::bert::BertNormalizer;
        let normalizer = BertNormalizer::new(true, true, Some(false), false);
        tokenizer.with_normalizer(normalizer.into());
        use tokenizers::pre_tokenizers::whitespace::Whitespace;
        tokenizer.with_pre_tokenizer(Whitespace.into());
        tokenizer
    } else {
        return Err(QaError::Tokenization("No tokenizer found".to_string()));
    };

    // Keep the full question; truncate only the context segment.
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy: TruncationStrategy::OnlySecond,
            ..Default::default()
        }))
        .map_err(|e| QaError::Tokenization(e.to_string()))?;

    Ok(tokenizer)
}
