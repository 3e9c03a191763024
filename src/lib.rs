pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingredient_parser;
pub mod nutrients;
pub mod nutritional_matcher;
pub mod recipe_aggregator;
pub mod recipe_converter;
pub mod recipe_parser;
pub mod search;
pub mod structured_data;
pub mod text_normalizer;
