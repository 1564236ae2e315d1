use stockyard_shared::{ItemRequest, Offer, OfferStatus, Role, Session};

/// Why the acting user may not decide on an offer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    #[error("No signed-in user")]
    NotSignedIn,

    #[error("Only warehouse employees can decide on offers")]
    NotEmployee,

    #[error("Request belongs to another warehouse")]
    WrongWarehouse,

    #[error("Offer is already {0}")]
    NotPending(OfferStatus),
}

/// Role and warehouse half of the rule; independent of any particular offer.
pub fn can_manage(session: &Session, request: &ItemRequest) -> Result<(), Ineligible> {
    let user = session.user.as_ref().ok_or(Ineligible::NotSignedIn)?;
    if user.role != Role::Employee {
        return Err(Ineligible::NotEmployee);
    }
    match user.employee_warehouse() {
        Some(warehouse_id) if warehouse_id == request.warehouse_id => Ok(()),
        _ => Err(Ineligible::WrongWarehouse),
    }
}

/// An offer can be decided only by an employee of the request's warehouse,
/// and only while it is still pending.
///
/// This is a convenience for the page; the Request Store enforces the same
/// rule on its side and stays authoritative.
pub fn can_decide(session: &Session, request: &ItemRequest, offer: &Offer) -> Result<(), Ineligible> {
    can_manage(session, request)?;
    if !offer.is_pending() {
        return Err(Ineligible::NotPending(offer.status));
    }
    Ok(())
}
