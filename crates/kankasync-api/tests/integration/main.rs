//! Integration tests for kankasync-api
//!
//! Uses wiremock to simulate the Kanka API and verifies end-to-end
//! behavior of the client, pagination and the remote client port.

mod common;

mod test_campaigns;
mod test_pagination;
mod test_uploads;
