/// hnd_service: Bavarian flood service (HND) gauge pages as Prometheus metrics.
///
/// # Module structure
///
/// ```text
/// hnd_service
/// ├── model       — StationReading and the -1 sentinel conventions
/// ├── civil_zone  — timezone the station pages print their timestamps in
/// ├── config      — service configuration loader (hnd.toml + environment)
/// ├── parser
/// │   ├── markup    — HTML clean-up ahead of the XML reader
/// │   ├── tokens    — HTML token stream (TokenSource, HtmlTokenizer)
/// │   ├── state     — parser states and page landmarks
/// │   ├── timestamp — "dd.mm.yy,HH:MM" parsing
/// │   ├── numeric   — lenient integer/decimal coercion
/// │   └── warnings  — per-field warning sink
/// ├── metrics     — Prometheus text exposition of a reading
/// ├── endpoint    — HTTP API (/metrics?station=, /health)
/// └── ingest
///     ├── hnd     — station page URL construction + retrieval
///     └── fixtures (test only) — representative station pages
/// ```

/// Public modules
pub mod civil_zone;
pub mod config;
pub mod endpoint;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod parser;
