use catalog_db::CatalogStore;

use super::extract::RawCandidate;

/// True when the catalog already holds an entry with this exact title and
/// author, pending or approved.
///
/// Call it immediately before persisting the candidate. An earlier candidate
/// from the same run only counts once it has been written.
pub async fn is_duplicate(
    candidate: &RawCandidate,
    store: &dyn CatalogStore,
) -> catalog_db::Result<bool> {
    Ok(store
        .find_one(&candidate.title, &candidate.author)
        .await?
        .is_some())
}
