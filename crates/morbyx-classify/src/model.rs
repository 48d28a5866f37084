//! BERT sequence classifier using Candle.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::sync::Api;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use crate::{ClassifyError, Result};

/// Yes/no relevance judgement over one article text.
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    async fn is_relevant(&self, text: &str) -> Result<bool>;
}

/// Classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Hugging Face model id used when no local directory is given.
    pub model_id: String,
    /// Directory holding fine-tuned weights; takes precedence.
    pub model_dir: Option<PathBuf>,
    pub max_length: usize,
    pub use_gpu: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_id: "dmis-lab/biobert-v1.1".to_string(),
            model_dir: None,
            max_length: 512,
            use_gpu: true,
        }
    }
}

impl ClassifierConfig {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(dir.into()),
            ..Default::default()
        }
    }
}

/// BERT relevance classifier: a two-label head over the `[CLS]` state.
pub struct BertClassifier {
    model: BertModel,
    tokenizer: Tokenizer,
    classifier: Tensor,
    classifier_bias: Tensor,
    device: Device,
}

impl BertClassifier {
    pub async fn new(config: ClassifierConfig) -> Result<Self> {
        let start = Instant::now();
        info!(
            "Loading relevance classifier: {}",
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
            download_model(&cfg)
        })
        .await
        .map_err(|e| ClassifyError::Download(e.to_string()))??;

        let vb = if weights_path.extension().map(|e| e == "safetensors").unwrap_or(false) {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
                    .map_err(|e| ClassifyError::ModelLoad(e.to_string()))?
            }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)
                .map_err(|e| ClassifyError::ModelLoad(e.to_string()))?
        };

        let model = BertModel::load(vb.clone(), &bert_config)
            .or_else(|_| BertModel::load(vb.pp("bert"), &bert_config))
            .map_err(|e| ClassifyError::ModelLoad(format!("BertModel: {}", e)))?;

        let hidden_size = bert_config.hidden_size;
        let classifier = vb
            .pp("classifier")
            .get((2, hidden_size), "weight")
            .or_else(|_| vb.get((2, hidden_size), "classifier.weight"))
            .map_err(|e| ClassifyError::ModelLoad(format!("classifier: {}", e)))?;
        let classifier_bias = vb
            .pp("classifier")
            .get(2, "bias")
            .or_else(|_| vb.get(2, "classifier.bias"))
            .map_err(|e| ClassifyError::ModelLoad(format!("classifier bias: {}", e)))?;

        info!("Relevance classifier loaded in {:?}", start.elapsed());

        Ok(Self {
            model,
            tokenizer,
            classifier,
            classifier_bias,
            device,
        })
    }

    /// Classify one article text; label 1 means "discusses risk factors".
    fn classify(&self, text: &str) -> Result<bool> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifyError::Tokenization(e.to_string()))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        if input_ids.is_empty() {
            return Ok(false);
        }
        let seq_len = input_ids.len();

        let input_ids_tensor = Tensor::new(&input_ids[..], &self.device)?
            .unsqueeze(0)?
            .to_dtype(DType::I64)?;
        let token_type_ids = Tensor::zeros((1, seq_len), DType::I64, &self.device)?;
        let attention_mask = Tensor::ones((1, seq_len), DType::F32, &self.device)?;

        let hidden_states =
            self.model
                .forward(&input_ids_tensor, &token_type_ids, Some(&attention_mask))?;

        // Pool the [CLS] state: [1, seq, hidden] -> [1, hidden]
        let cls = hidden_states.narrow(1, 0, 1)?.squeeze(1)?;
        let logits = cls
            .matmul(&self.classifier.t()?)?
            .broadcast_add(&self.classifier_bias)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        Ok(logits[1] > logits[0])
    }
}

#[async_trait]
impl RelevanceModel for BertClassifier {
    async fn is_relevant(&self, text: &str) -> Result<bool> {
        self.classify(text)
    }
}

fn download_model(config: &ClassifierConfig) -> Result<(Config, Tokenizer, PathBuf)> {
    let (config_path, tokenizer_path, vocab_path, weights_path) =
        if let Some(dir) = &config.model_dir {
            let weights = if dir.join("model.safetensors").exists() {
                dir.join("model.safetensors")
            } else {
                dir.join("pytorch_model.bin")
            };
            (
                dir.join("config.json"),
                Some(dir.join("tokenizer.json")).filter(|p| p.exists()),
                Some(dir.join("vocab.txt")).filter(|p| p.exists()),
                weights,
            )
        } else {
            use hf_hub::{Repo, RepoType};
            let api =
                Api::new().map_err(|e| ClassifyError::Download(format!("API init: {}", e)))?;
            let repo = Repo::new(config.model_id.clone(), RepoType::Model);
            let api_repo = api.repo(repo);
            let config_path = api_repo
                .get("config.json")
                .map_err(|e| ClassifyError::Download(format!("config.json: {}", e)))?;
            let weights = api_repo
                .get("model.safetensors")
                .or_else(|_| api_repo.get("pytorch_model.bin"))
                .map_err(|e| ClassifyError::Download(format!("model weights: {}", e)))?;
            (
                config_path,
                api_repo.get("tokenizer.json").ok(),
                api_repo.get("vocab.txt").ok(),
                weights,
            )
        };

    let content = std::fs::read_to_string(&config_path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| ClassifyError::ModelLoad(format!("parse config: {}", e)))?;
    let bert_config = Config {
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
    };

    let mut tokenizer = if let Some(path) = tokenizer_path {
        Tokenizer::from_file(&path).map_err(|e| ClassifyError::Tokenization(e.to_string()))?
    } else if let Some(vocab_path) = vocab_path {
        debug!("Building tokenizer from vocab.txt");
        let vocab_content = std::fs::read_to_string(&vocab_path)?;
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
            .map_err(|e| ClassifyError::Tokenization(format!("WordPiece: {}", e)))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        use tokenizers::normalizers::bert::BertNormalizer;
        let normalizer = BertNormalizer::new(true, true, Some(false), false);
        tokenizer.with_normalizer(normalizer.into());
        use tokenizers::pre_tokenizers::whitespace::Whitespace;
        tokenizer.with_pre_tokenizer(Whitespace.into());
        tokenizer
    } else {
        return Err(ClassifyError::Tokenization("No tokenizer found".to_string()));
    };

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.max_length,
            strategy: TruncationStrategy::LongestFirst,
            ..Default::default()
        }))
        .map_err(|e| ClassifyError::Tokenization(e.to_string()))?;

    Ok((bert_config, tokenizer, weights_path))
}
