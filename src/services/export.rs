//! Shopping list export.

use crate::{
    aggregation::aggregate,
    database::store::RelationStore,
    error::RenderError,
    identity::RequestIdentity,
    schema::ShoppingListItem,
    SHOPPING_LIST_FILENAME,
};

/// Turns aggregated shopping list items into a PDF document.
pub trait ShoppingListRenderer: Send + Sync {
    fn render(&self, items: &[ShoppingListItem]) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn from_download(download: bool) -> Self {
        if download {
            Self::Attachment
        } else {
            Self::Inline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShoppingListExport {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub disposition: Disposition,
}

impl ShoppingListExport {
    pub fn content_disposition(&self) -> String {
        format!("{}; filename=\"{}\"", self.disposition.as_str(), self.filename)
    }
}

/// An empty list still renders; only a renderer failure is an error (404).
pub async fn export_shopping_list<S, R>(
    identity: &RequestIdentity,
    download: bool,
    store: &S,
    renderer: &R,
) -> Result<ShoppingListExport, potion::Error>
where
    S: RelationStore + ?Sized,
    R: ShoppingListRenderer + ?Sized,
{
    let actor = identity.reader();
    let items = aggregate(actor.as_ref(), store).await?;

    Ok(ShoppingListExport {
        bytes: renderer.render(&items)?,
        filename: SHOPPING_LIST_FILENAME,
        disposition: Disposition::from_download(download),
    })
}
