use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item request, opaque to this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

/// Identifier of a vendor offer, unique across the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for OfferId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Offer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    /// Accepted and rejected offers never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OfferStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "PENDING",
            OfferStatus::Accepted => "ACCEPTED",
            OfferStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded `{ name }` reference the store attaches to warehouses, employees and vendors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

/// An inventory request raised by a warehouse, with the vendor offers made against it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub id: RequestId,
    pub item_name: String,
    pub quantity: u32,
    pub warehouse_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Arrival order.
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl ItemRequest {
    pub fn new(id: impl Into<String>, item_name: impl Into<String>, quantity: u32, warehouse_id: impl Into<String>) -> Self {
        Self {
            id: RequestId(id.into()),
            item_name: item_name.into(),
            quantity,
            warehouse_id: warehouse_id.into(),
            warehouse: None,
            employee: None,
            created_at: None,
            offers: Vec::new(),
        }
    }

    /// Append an offer, keeping arrival order
    pub fn add_offer(&mut self, offer: Offer) {
        self.offers.push(offer);
    }

    pub fn offer(&self, offer_id: &OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| &o.id == offer_id)
    }

    pub fn offer_mut(&mut self, offer_id: &OfferId) -> Option<&mut Offer> {
        self.offers.iter_mut().find(|o| &o.id == offer_id)
    }
}

/// A vendor's proposal to fulfil an item request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<NamedRef>,
    pub quantity: u32,
    pub status: OfferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Offer {
    /// Create a pending offer from a vendor
    pub fn new(id: impl Into<String>, vendor_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: OfferId(id.into()),
            vendor_id: None,
            vendor: Some(NamedRef { name: vendor_name.into() }),
            quantity,
            status: OfferStatus::Pending,
            created_at: None,
        }
    }

    pub fn vendor_name(&self) -> &str {
        self.vendor.as_ref().map(|v| v.name.as_str()).unwrap_or("Unknown")
    }

    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_payload() {
        let payload = serde_json::json!([{
            "id": "r1",
            "itemName": "Pallet wrap",
            "quantity": 40,
            "warehouseId": "wh-7",
            "warehouse": { "name": "North Dock" },
            "employee": { "name": "Sam" },
            "createdAt": "2024-03-01T09:30:00Z",
            "offers": [
                { "id": "o1", "vendorId": "v1", "vendor": { "name": "Acme" }, "quantity": 40, "status": "PENDING" },
                { "id": "o2", "quantity": 10, "status": "REJECTED" }
            ]
        }]);

        let requests: Vec<ItemRequest> = serde_json::from_value(payload).unwrap();
        let request = &requests[0];

        assert_eq!(request.id, RequestId::from("r1"));
        assert_eq!(request.warehouse_id, "wh-7");
        assert_eq!(request.offers.len(), 2);
        assert_eq!(request.offers[0].vendor_name(), "Acme");
        assert_eq!(request.offers[1].vendor_name(), "Unknown");
        assert_eq!(request.offers[1].status, OfferStatus::Rejected);
        assert!(request.offers[0].is_pending());
    }

    #[test]
    fn missing_offers_means_none_yet() {
        let request: ItemRequest = serde_json::from_value(serde_json::json!({
            "id": "r2", "itemName": "Gloves", "quantity": 5, "warehouseId": "wh-1"
        }))
        .unwrap();

        assert!(request.offers.is_empty());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OfferStatus::Pending.is_terminal());
        assert!(OfferStatus::Accepted.is_terminal());
        assert!(OfferStatus::Rejected.is_terminal());
        assert_eq!(serde_json::to_value(OfferStatus::Accepted).unwrap(), "ACCEPTED");
    }
}
