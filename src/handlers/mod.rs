// Route handlers, one module per route family.
//
// Public: /, /health, /jwt, /service, /services, /reviews, /myreviews/:id
// Bearer token: GET /myreviews

pub mod jwt;
pub mod my_reviews;
pub mod reviews;
pub mod root;
pub mod services;
pub mod utils;
