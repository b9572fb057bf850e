//! Maximum-information item selection.
//!
//! Given a candidate pool and the session, picks the item that maximizes
//! Fisher information at the current ability, enforcing section order,
//! no-repeat, and idempotent re-fetch of the pending item. Section
//! advancement on candidate exhaustion is an explicit loop, so pathological
//! runs of empty sections cost iterations, not stack depth.

use crate::error::CatError;
use crate::irt::fisher_information;
use crate::model::{Domain, Item};
use crate::session::Session;

/// Outcome of a "next item" request.
#[derive(Debug, Clone, PartialEq)]
pub enum NextItem {
    /// The item to administer next.
    Item(Item),
    /// The session is paused at a section boundary; the named section
    /// starts once the session is resumed.
    SectionBreak(Domain),
    /// All sections are exhausted; the session is now finished.
    Exhausted,
}

fn has_eligible(pool: &[Item], session: &Session, domain: Domain) -> bool {
    pool.iter()
        .any(|item| item.domain == domain && !session.seen_item_ids.contains(&item.id))
}

/// Select the next item for `session` from `pool`.
///
/// A pending item is returned as-is (from the session's own snapshot, so a
/// client retry never re-selects or re-exposes). Otherwise the current
/// section's unseen candidates are scanned for maximum information; ties
/// break toward the earliest pool position.
pub fn select_next_item(session: &mut Session, pool: &[Item]) -> Result<NextItem, CatError> {
    if session.finished {
        return Err(CatError::TestAlreadyFinished);
    }

    if let Some(pending_id) = &session.pending_item_id {
        let item = session
            .administered_item(pending_id)
            .cloned()
            .ok_or_else(|| {
                CatError::InvalidResponse(format!("pending item '{pending_id}' has no snapshot"))
            })?;
        return Ok(NextItem::Item(item));
    }

    if session.awaiting_resume {
        return Ok(NextItem::SectionBreak(session.current_domain()));
    }

    loop {
        let domain = session.current_domain();
        let mut best: Option<(&Item, f64)> = None;
        for item in pool {
            if item.domain != domain || session.seen_item_ids.contains(&item.id) {
                continue;
            }
            let info = fisher_information(&item.model, session.ability);
            // Strict comparison keeps the first maximal candidate, making
            // ties deterministic in pool order.
            if best.is_none_or(|(_, best_info)| info > best_info) {
                best = Some((item, info));
            }
        }

        if let Some((item, info)) = best {
            tracing::debug!(item_id = %item.id, %domain, info, "selected item");
            let chosen = item.clone();
            session.seen_item_ids.insert(chosen.id.clone());
            session.snapshot_item(&chosen);
            session.pending_item_id = Some(chosen.id.clone());
            return Ok(NextItem::Item(chosen));
        }

        // Current section has no eligible candidates: advance. Sections
        // with nothing to present are skipped without a pause; a section
        // that has items gets its boundary break.
        session.advance_section();
        if session.finished {
            tracing::info!(session_id = %session.id, "candidate pool exhausted, session finished");
            return Ok(NextItem::Exhausted);
        }
        if has_eligible(pool, session, session.current_domain()) {
            return Ok(NextItem::SectionBreak(session.current_domain()));
        }
        session.awaiting_resume = false;
    }
}
