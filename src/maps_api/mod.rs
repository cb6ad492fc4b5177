pub mod backend;
pub mod tile_retriever;
