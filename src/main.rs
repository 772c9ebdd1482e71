use research_desk::backend::HttpBackend;
use research_desk::handlers::{
    AskArgs, ChatHistoryArgs, CreateModelArgs, DeleteResourceArgs, IdeaIdArgs, ShareIdeaArgs,
    ToolHandlers, UpdateIdeaArgs, UploadResourceArgs,
};
use research_desk::{Dashboard, Repository};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler,
    transport::stdio,
    ServiceExt,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting Research Desk MCP Server");

    let config = research_desk::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = research_desk::store::open_store(&config.store)?;
    let backend = HttpBackend::new(&config.backend.base_url);
    tracing::info!("Backend API at {}", backend.base_url());

    match research_desk::backend::BackendApi::health(&backend).await {
        Ok(true) => tracing::info!("Backend is healthy"),
        Ok(false) => tracing::warn!("Backend reported an unhealthy status"),
        Err(e) => tracing::warn!("Backend health check failed: {}. Uploads and chat may fail.", e),
    }

    let dashboard = Dashboard::new(
        Repository::new(store),
        Arc::new(backend),
        config.gemini.embedding_model.clone(),
    );
    let handlers = ToolHandlers::new(dashboard);
    tracing::info!("Tool handlers initialized");

    let server = ResearchDeskServer::new(Arc::new(handlers));

    tracing::info!("Server initialized, starting stdio transport");

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

fn respond(result: research_desk::Result<String>, action: &str) -> Result<CallToolResult, rmcp::ErrorData> {
    match result {
        Ok(json_response) => Ok(CallToolResult::success(vec![Content::text(json_response)])),
        Err(e) => Ok(CallToolResult::success(vec![Content::text(
            serde_json::json!({"error": format!("{} failed: {}", action, e)}).to_string(),
        )])),
    }
}

struct ResearchDeskServer {
    handlers: Arc<ToolHandlers>,
    tool_router: ToolRouter<Self>,
}

impl ResearchDeskServer {
    fn new(handlers: Arc<ToolHandlers>) -> Self {
        Self {
            handlers,
            tool_router: Self::tool_router(),
        }
    }
}

#[rmcp::tool_router]
impl ResearchDeskServer {
    #[tool(
        name = "upload_resource",
        description = "Upload a research file (PDF, TXT, CSV or JSON). The file is processed, chunked and embedded so it can ground chat answers."
    )]
    async fn upload_resource(
        &self,
        params: Parameters<UploadResourceArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_upload_resource(params.0).await, "Upload")
    }

    #[tool(name = "list_resources", description = "List uploaded resources, newest first.")]
    async fn list_resources(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_list_resources().await, "Listing resources")
    }

    #[tool(name = "delete_resource", description = "Delete an uploaded resource by id.")]
    async fn delete_resource(
        &self,
        params: Parameters<DeleteResourceArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_delete_resource(params.0).await, "Delete")
    }

    #[tool(
        name = "register_model",
        description = "Register a trading model with its architecture and backtest performance (Sharpe ratio, win rate %, max drawdown %)."
    )]
    async fn register_model(
        &self,
        params: Parameters<CreateModelArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_create_model(params.0).await, "Model registration")
    }

    #[tool(name = "list_models", description = "List registered models, newest first.")]
    async fn list_models(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_list_models().await, "Listing models")
    }

    #[tool(
        name = "share_idea",
        description = "Share a research idea with the team. The idea text is embedded for topic discovery."
    )]
    async fn share_idea(
        &self,
        params: Parameters<ShareIdeaArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_share_idea(params.0).await, "Sharing idea")
    }

    #[tool(name = "list_ideas", description = "List shared ideas with their topics and likes, newest first.")]
    async fn list_ideas(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_list_ideas().await, "Listing ideas")
    }

    #[tool(name = "update_idea", description = "Edit an idea's title, description or topic.")]
    async fn update_idea(
        &self,
        params: Parameters<UpdateIdeaArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_update_idea(params.0).await, "Updating idea")
    }

    #[tool(name = "like_idea", description = "Like an idea. Concurrent likes are all counted.")]
    async fn like_idea(
        &self,
        params: Parameters<IdeaIdArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_like_idea(params.0).await, "Like")
    }

    #[tool(
        name = "discover_topics",
        description = "Run topic discovery across all ideas and label them with the leading topic. Needs at least two ideas."
    )]
    async fn discover_topics(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_label_topics().await, "Topic discovery")
    }

    #[tool(
        name = "ask",
        description = "Ask the team knowledge base. Answers are grounded in the most relevant uploaded resources, which are listed as sources."
    )]
    async fn ask(&self, params: Parameters<AskArgs>) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_ask(params.0).await, "Chat")
    }

    #[tool(name = "chat_history", description = "Show a user's past questions and answers in chronological order.")]
    async fn chat_history(
        &self,
        params: Parameters<ChatHistoryArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_chat_history(params.0).await, "Chat history")
    }

    #[tool(name = "overview", description = "Count resources, models and ideas.")]
    async fn overview(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        respond(self.handlers.handle_overview().await, "Overview")
    }
}

#[tool_handler]
impl rmcp::ServerHandler for ResearchDeskServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Research desk for a trading team. Upload resources, register models, \
                 share ideas and ask grounded questions over the uploaded material."
                    .to_string(),
            ),
        }
    }
}
