//! DTOs for decoding authority JSON responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! records in one pass. Decoding is lenient where the authority is known to
//! vary: list envelopes, owner shapes and message fields.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::ports::{Acknowledgement, LoginGrant};
use crate::domain::{AuthToken, Identity, Item, ItemId, Owner, UserId};

/// `{message, data}` envelope shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl MessageDto {
    /// Lenient decode; anything that is not a JSON object yields no message.
    pub(super) fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// `message` when present and non-blank, else `data` when it is a string.
    pub(super) fn into_text(self) -> Option<String> {
        let data_text = match self.data {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        self.message
            .into_iter()
            .chain(data_text)
            .find(|text| !text.trim().is_empty())
    }

    pub(super) fn into_acknowledgement(self) -> Acknowledgement {
        Acknowledgement {
            message: self.into_text(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct LoginDataDto {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
}

impl LoginResponseDto {
    pub(super) fn into_grant(self) -> Result<LoginGrant, String> {
        let (token, user) = match self.data {
            Some(data @ Value::Object(_)) => {
                let decoded: LoginDataDto = serde_json::from_value(data)
                    .map_err(|error| format!("invalid login data: {error}"))?;
                (decoded.token.and_then(AuthToken::new), decoded.user)
            }
            _ => (None, None),
        };
        Ok(LoginGrant {
            message: self.message,
            token,
            user,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ItemListDto {
    Envelope { data: Vec<ItemDto> },
    Bare(Vec<ItemDto>),
}

impl ItemListDto {
    pub(super) fn into_domain_items(self) -> Result<Vec<Item>, String> {
        let (Self::Envelope { data: items } | Self::Bare(items)) = self;
        items.into_iter().map(ItemDto::into_domain_item).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemDto {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    category: String,
    price: f64,
    quantity: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    admins: Option<OwnersDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwnersDto {
    Many(Vec<OwnerDto>),
    One(OwnerDto),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwnerDto {
    Id(String),
    Expanded {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl OwnerDto {
    fn into_domain_owner(self) -> Result<Owner, String> {
        let (raw_id, name) = match self {
            Self::Id(id) => (id, None),
            Self::Expanded { id, name } => (id, name),
        };
        let id = UserId::new(raw_id).map_err(|error| format!("invalid owner id: {error}"))?;
        Ok(Owner { id, name })
    }
}

impl ItemDto {
    fn into_domain_item(self) -> Result<Item, String> {
        let id = ItemId::new(self.id).map_err(|error| format!("invalid item id: {error}"))?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("item {id} has an invalid price"));
        }
        let owners = match self.admins {
            None => Vec::new(),
            Some(OwnersDto::One(owner)) => vec![owner.into_domain_owner()?],
            Some(OwnersDto::Many(owners)) => owners
                .into_iter()
                .map(OwnerDto::into_domain_owner)
                .collect::<Result<_, _>>()?,
        };
        Ok(Item {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            quantity: self.quantity,
            image: self.image.filter(|url| !url.trim().is_empty()),
            owners,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for DTO decoding.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn decode_items(value: &Value) -> Vec<Item> {
        serde_json::from_value::<ItemListDto>(value.clone())
            .expect("list decodes")
            .into_domain_items()
            .expect("items map")
    }

    #[rstest]
    #[case(json!({ "data": [{ "_id": "a1", "name": "Fudge", "category": "candy", "price": 2, "quantity": 3 }] }))]
    #[case(json!([{ "_id": "a1", "name": "Fudge", "category": "candy", "price": 2, "quantity": 3 }]))]
    fn accepts_both_list_envelopes(#[case] body: Value) {
        let items = decode_items(&body);
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(|i| i.id.as_str()), Some("a1"));
    }

    #[rstest]
    fn accepts_both_owner_shapes() {
        let items = decode_items(&json!([
            { "_id": "a1", "name": "Fudge", "price": 2, "quantity": 3, "admins": ["u1", "u2"] },
            { "_id": "a2", "name": "Toffee", "price": 1, "quantity": 0,
              "admins": [{ "_id": "u3", "name": "Ada" }] },
            { "_id": "a3", "name": "Gum", "price": 1, "quantity": 0, "admins": "u4" }
        ]));
        let owners: Vec<Vec<(String, Option<String>)>> = items
            .iter()
            .map(|item| {
                item.owners
                    .iter()
                    .map(|o| (o.id.to_string(), o.name.clone()))
                    .collect()
            })
            .collect();
        assert_eq!(
            owners,
            vec![
                vec![("u1".to_owned(), None), ("u2".to_owned(), None)],
                vec![("u3".to_owned(), Some("Ada".to_owned()))],
                vec![("u4".to_owned(), None)],
            ]
        );
    }

    #[rstest]
    fn rejects_negative_prices() {
        let decoded = serde_json::from_value::<ItemListDto>(json!([
            { "_id": "a1", "name": "Fudge", "price": -1, "quantity": 3 }
        ]))
        .expect("shape decodes")
        .into_domain_items();
        assert!(decoded.is_err());
    }

    #[rstest]
    #[case(br#"{"message":"Sweet added"}"#.as_slice(), Some("Sweet added"))]
    #[case(br#"{"data":"Email already used"}"#.as_slice(), Some("Email already used"))]
    #[case(br#"{"message":"  ","data":"fallback"}"#.as_slice(), Some("fallback"))]
    #[case(br#"{"data":{"id":1}}"#.as_slice(), None)]
    #[case(b"<html>oops</html>".as_slice(), None)]
    #[case(b"".as_slice(), None)]
    fn message_extraction(#[case] body: &[u8], #[case] expected: Option<&str>) {
        assert_eq!(MessageDto::from_body(body).into_text().as_deref(), expected);
    }

    #[rstest]
    fn login_grant_carries_token_and_user() {
        let dto: LoginResponseDto = serde_json::from_value(json!({
            "message": "Welcome",
            "data": { "token": "t1", "user": { "_id": "u1", "name": "Ada", "email": "a@b.c", "role": "admin" } }
        }))
        .expect("decodes");
        let grant = dto.into_grant().expect("maps");
        assert_eq!(grant.message.as_deref(), Some("Welcome"));
        assert_eq!(grant.token.map(|t| t.expose().to_owned()), Some("t1".to_owned()));
        assert!(grant.user.is_some_and(|u| u.is_admin()));
    }

    #[rstest]
    fn login_grant_tolerates_missing_data() {
        let dto: LoginResponseDto =
            serde_json::from_value(json!({ "message": "Invalid" })).expect("decodes");
        let grant = dto.into_grant().expect("maps");
        assert!(grant.token.is_none());
        assert!(grant.user.is_none());
    }
}
