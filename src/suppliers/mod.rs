
pub mod animepahe;
