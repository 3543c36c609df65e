//! HTTP client for MCP execution servers.
//!
//! Provides session management, a self-healing event stream listener and a
//! single tool execution primitive that higher-level tool wrappers build on.
//!
//! # Example
//!
//! ```no_run
//! use relay_client::{ListenerConfig, McpHttp, StartupRetry, Toolkit};
//!
//! # async fn example() -> relay_client::Result<()> {
//! let transport = McpHttp::builder()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! let toolkit = Toolkit::bootstrap(transport, ListenerConfig::default(), StartupRetry::default()).await;
//!
//! toolkit.register_event_callback("progress", |event| {
//!     println!("progress: {}", event.payload);
//! });
//!
//! let result = toolkit.read_file("notes/todo.txt").await?;
//! if result.is_success() {
//!     println!("{}", result.data());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Endpoints
//!
//! - `POST /api/session`: create a session
//! - `GET /api/session/{id}`: validate a session
//! - `GET /api/sse/{id}`: session event stream
//! - `POST /api/adk-webhook`: execute a tool

pub mod error;
pub mod events;
pub mod session;
pub mod toolkit;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use events::{
    EventCallback, EventListener, HandshakeFailurePolicy, ListenerConfig, ListenerState,
    ListenerStatus,
};
pub use session::SessionManager;
pub use toolkit::{DEFAULT_ENCODING, StartupRetry, Toolkit, ToolkitHealth};
pub use transport::{ClientBuilder, DEFAULT_SERVER_URL, McpHttp};
pub use types::{Event, Parameters, SESSION_ID_PARAM, ToolRequest, ToolResult, parameters};
