mod movie;
mod raw;
mod responses;

pub use movie::{MetadataRecord, MovieRecord};
pub use raw::{
    parse_director, parse_names, parse_top_cast, release_year, try_parse_names, RawCreditRow, RawMovieRow,
};
pub use responses::{
    ApiResponse, GenreMatch, LogSearchRequest, MovieSummary, RecommendResponse, Recommendation,
};
