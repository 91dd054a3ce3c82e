use crate::model::Score;
use md5::Context;

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongIdentity {
    pub name: String,
    pub hash: String,
}

/// Name and content hash used to group session records by song.
pub fn song_identity(score: &Score) -> Result<SongIdentity, IdentityError> {
    let canonical = serde_json::to_vec(score).map_err(|e| IdentityError::Serde(e.to_string()))?;
    let mut context = Context::new();
    context.consume(&canonical);
    Ok(SongIdentity {
        name: score.title().to_string(),
        hash: format!("{:x}", context.finalize()),
    })
}
