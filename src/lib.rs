//! # docstore-mcp
//!
//! MCP (Model Context Protocol) server for immutable, content-hashed
//! structured documents.
//!
//! A document is assembled from typed blocks (headings, paragraphs, tables,
//! figures) in a [`DocumentStore`], finalized once by
//! [`DocumentStore::build`], and then served read-only over newline-delimited
//! JSON-RPC 2.0 on stdin/stdout.
//!
//! ## 3 Query Tools
//!
//! `search_content`, `get_section`, `list_headings`
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "docstore": {
//!       "command": "/path/to/docstore-mcp",
//!       "args": ["--document", "/path/to/document.json"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use docstore_mcp::{BlockType, DocumentInfo, DocumentSession, DocumentStore, McpServer};
//!
//! let mut store = DocumentStore::new(DocumentInfo::titled("Terms"));
//! store.add_block(BlockType::Heading, "Terms and Conditions", Some(1)).unwrap();
//! store.add_block(BlockType::Paragraph, "These terms are legally binding on you...", None).unwrap();
//! let document = store.build().unwrap();
//!
//! let mut server = McpServer::new(DocumentSession::new(document)).unwrap();
//! # let _ = &mut server;
//! // server.run(std::future::pending()).await
//! ```

#![warn(missing_docs)]

mod block;
mod convert;
mod error;
mod hash;
mod index;
mod resources;
mod server;
mod session;
mod source;
mod store;
mod tools;

pub use block::{Block, BlockMetadata, BlockType, Document, DocumentInfo};
pub use convert::{error_result, text_result};
pub use error::{McpError, Result};
pub use hash::{normalize_whitespace, ContentHasher};
pub use index::{
    tokenize, Concept, DocumentStats, Indexer, OutlineNode, SearchHit, SectionSummary,
    DEFAULT_CONCEPT_LIMIT, DEFAULT_OUTLINE_LEVEL, DEFAULT_SEARCH_LIMIT,
};
pub use resources::{ResourceDef, CONCEPTS_URI, METADATA_URI, OUTLINE_URI, SECTIONS_URI_PREFIX};
pub use server::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, Method, MethodTable, ServerConfig,
    ServerState,
};
pub use session::DocumentSession;
pub use source::{DocumentSource, SourceBlock};
pub use store::{validate, BlockSpec, DocumentStore, StoreError, Violation};
pub use tools::{ToolDef, ToolRegistry};
