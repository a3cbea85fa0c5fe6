pub mod media_storage;
pub mod orientation;
pub mod rename_map;
pub mod story_service;
pub mod story_store;
