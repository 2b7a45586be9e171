//! Wires configuration into a ready-to-run query pipeline.

use crate::config::{ConfigError, FileConfig, has_errors};
use crate::logging::JsonlConversationLogger;
use crate::openai::{OpenAiChatGateway, OpenAiClient, OpenAiEmbedder};
use crate::pinecone::PineconeHybridIndex;
use crate::sparse::{Bm25Encoder, Bm25Params};
use grounded_application::{
    ConversationLogger, NoConversationLogger, PipelineContext, ProcessQueryUseCase,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound for downloading the BM25 parameter dump at startup.
const BM25_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the pipeline described by `config`.
///
/// Fails on any error-level validation issue, on missing credentials, and
/// when an external dependency cannot be reached while connecting.
pub async fn build_pipeline(config: &FileConfig) -> Result<ProcessQueryUseCase, ConfigError> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    if has_errors(&issues) {
        return Err(ConfigError::Invalid(
            issues.into_iter().filter(|i| i.is_error()).collect(),
        ));
    }

    let openai_key =
        config
            .openai
            .resolve_api_key()
            .ok_or_else(|| ConfigError::MissingApiKey {
                service: "OpenAI",
                section: "openai",
                env: config.openai.api_key_env.clone(),
            })?;
    let pinecone_key =
        config
            .pinecone
            .resolve_api_key()
            .ok_or_else(|| ConfigError::MissingApiKey {
                service: "Pinecone",
                section: "pinecone",
                env: config.pinecone.api_key_env.clone(),
            })?;

    let chat_client = OpenAiClient::new(
        openai_key.as_str(),
        config.openai.base_url.as_str(),
        Duration::from_secs(config.llm.request_timeout_secs),
    )?;
    let gateway = OpenAiChatGateway::new(chat_client, config.llm.model.as_str())
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);

    let embed_client = OpenAiClient::new(
        openai_key,
        config.openai.base_url.as_str(),
        Duration::from_secs(config.embeddings.request_timeout_secs),
    )?;
    let embedder = OpenAiEmbedder::new(
        embed_client,
        config.embeddings.model.as_str(),
        config.embeddings.dimensions,
    );

    let sparse_encoder = Bm25Encoder::from_params(load_bm25_params(config).await?)?;
    let index = connect_index(config, pinecone_key).await?;
    let logger = conversation_logger(config);

    info!(
        chat_model = %config.llm.model,
        embedding_model = %config.embeddings.model,
        index = %index.host(),
        "Pipeline ready"
    );

    let context = PipelineContext::new(
        Arc::new(gateway),
        Arc::new(embedder),
        Arc::new(sparse_encoder),
        Arc::new(index),
    )
    .with_params(config.pipeline_params())
    .with_persona(config.persona.clone())
    .with_logger(logger);

    Ok(ProcessQueryUseCase::new(context))
}

async fn load_bm25_params(config: &FileConfig) -> Result<Bm25Params, ConfigError> {
    let params = match &config.retrieval.bm25_params_path {
        Some(path) => Bm25Params::from_path(Path::new(path))?,
        None => {
            info!(url = %config.retrieval.bm25_params_url, "Downloading BM25 parameters");
            Bm25Params::fetch(&config.retrieval.bm25_params_url, BM25_FETCH_TIMEOUT).await?
        }
    };
    Ok(params)
}

async fn connect_index(
    config: &FileConfig,
    api_key: String,
) -> Result<PineconeHybridIndex, ConfigError> {
    let pinecone = &config.pinecone;
    let timeout = Duration::from_secs(pinecone.request_timeout_secs);

    let index = match &pinecone.host {
        Some(host) => PineconeHybridIndex::new(api_key, host, timeout)?,
        None => {
            let name = pinecone
                .resolve_index_name()
                .ok_or_else(|| ConfigError::MissingIndexName {
                    env: pinecone.index_name_env.clone(),
                })?;
            PineconeHybridIndex::connect(api_key, &name, &pinecone.control_plane_url, timeout)
                .await
                .map_err(|source| ConfigError::Connect {
                    component: "Pinecone control plane",
                    source,
                })?
        }
    };

    Ok(index
        .with_namespace(pinecone.namespace.as_str())
        .with_text_key(pinecone.text_key.as_str())
        .with_alpha(config.retrieval.alpha)
        .with_api_version(pinecone.api_version.as_str()))
}

/// The transcript is optional; a file that cannot be opened only disables it.
fn conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(path) = &config.logging.conversation_log else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::open(path) {
        Ok(logger) => {
            info!(path = %logger.path().display(), "Writing conversation log");
            Arc::new(logger)
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Could not open conversation log; continuing without it");
            Arc::new(NoConversationLogger)
        }
    }
}
