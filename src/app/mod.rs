pub mod collection_service;
