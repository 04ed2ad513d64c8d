//! GitHub branch archive locations

/// Where the application sources are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Scheme and host serving the archive, e.g. `https://github.com`.
    pub base_url: String,
    /// Repository as `owner/name`.
    pub repo: String,
    pub branch: String,
}

impl SourceLocation {
    /// Branch archive URL: `<base>/<owner>/<repo>/archive/refs/heads/<branch>.zip`.
    pub fn archive_url(&self) -> String {
        format!(
            "{}/{}/archive/refs/heads/{}.zip",
            self.base_url.trim_end_matches('/'),
            self.repo.trim_matches('/'),
            self.branch
        )
    }

    /// Project page, used as the unit's `Documentation=` link.
    pub fn project_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.repo.trim_matches('/')
        )
    }
}
