/// API key issuing, lookup and rotation
pub mod api_key;

/// Instagram account credentials of a nightline
pub mod instagram;

/// Nightline registry and status state machine
pub mod nightline;

/// Per (nightline, status) configuration rows
pub mod nightline_status;

/// Status catalog
pub mod status;

/// Story slides bound to configuration rows
pub mod story_slide;

/// Input validation rules
pub mod validation;

/// Status update and reset workflows
pub mod workflow;
