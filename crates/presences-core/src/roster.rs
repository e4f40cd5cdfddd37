use tracing::info;

use crate::api::AttendanceApi;
use crate::error::Result;
use crate::model::Member;

/// Fetch every member; the server order becomes the report row order.
pub fn fetch_roster<A: AttendanceApi + ?Sized>(api: &A) -> Result<Vec<Member>> {
    let members = api.members()?;
    info!(count = members.len(), "Fetched member roster");
    Ok(members)
}
