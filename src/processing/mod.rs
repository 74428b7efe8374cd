//! Chunking, embedding and retrieval

pub mod document;
pub mod embeddings;
pub mod retriever;
pub mod vector_index;
