pub mod boundary_retriever;
