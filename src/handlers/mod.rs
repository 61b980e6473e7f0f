// handlers/mod.rs - HTTP handlers, one module per resource
//
// Reads are public; writes sit behind `middleware::ensure_admin` (see server.rs).
pub mod companies;
pub mod jobs;
