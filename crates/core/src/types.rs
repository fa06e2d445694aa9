/// Scene ids are assigned from 1 upward, once per build.
pub type SceneId = u32;

/// Chapter (episode) number.
pub type ChapterId = u32;

/// Narrative branch identifier. `0` is the linear default.
pub type BranchId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
