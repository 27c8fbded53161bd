//! Moving a recipient to the exclusion list.

use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::models::{Contact, ExcludedRecipient};
use crate::store::exclusions::insert_excluded;
use crate::store::is_unique_violation;
use crate::store::recipients::{delete_recipient, find_recipient_by_email};

/// Returned to the caller for every unsubscribe request, whether or not the
/// address was on the list.
pub const CONFIRMATION: &str = "Seu e-mail foi removido com sucesso.";

#[derive(Debug, Error)]
pub enum UnsubscribeError {
    #[error("email '{0}' is already on the exclusion list")]
    AlreadyExcluded(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// The recipient was removed and recorded as excluded.
    Moved(ExcludedRecipient),
    /// No active recipient had this address; nothing changed.
    NotSubscribed,
}

/// Move the recipient with exactly this `email` to the exclusion list.
///
/// The insert and delete commit together or not at all.
pub async fn unsubscribe(
    pool: &PgPool,
    email: &str,
) -> Result<UnsubscribeOutcome, UnsubscribeError> {
    let mut tx = pool.begin().await?;

    let Some(recipient) = find_recipient_by_email(&mut *tx, email).await? else {
        tx.rollback().await?;
        log::debug!("unsubscribe for unknown address ignored");
        return Ok(UnsubscribeOutcome::NotSubscribed);
    };

    let recipient_id = recipient.id;
    let contact = Contact::from(recipient);

    let excluded_id = insert_excluded(&mut *tx, &contact).await.map_err(|err| {
        if is_unique_violation(&err) {
            UnsubscribeError::AlreadyExcluded(contact.email.clone())
        } else {
            UnsubscribeError::Database(err)
        }
    })?;
    delete_recipient(&mut *tx, recipient_id).await?;

    tx.commit().await?;

    log::info!("moved {} to the exclusion list", contact.email);
    Ok(UnsubscribeOutcome::Moved(ExcludedRecipient {
        id: excluded_id,
        name: contact.name,
        email: contact.email,
    }))
}
