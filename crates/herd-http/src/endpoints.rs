//! Declarative endpoint table.
//!
//! Every named API operation is one row of `{method, path template, body
//! shape, fallback message}`; [`crate::ApiClient::call`] is the single
//! invoker that consumes it.

use crate::client::DEFAULT_FALLBACK;
use crate::error::{HttpError, Result};
use crate::types::{DispatchRequest, Method, MultipartForm, RequestBody};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::fmt;

/// Characters left alone inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How an operation sends its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyShape {
    Empty,
    Json,
    /// URL-encoded form fields.
    Form,
    /// Multipart form; the transport negotiates the boundary.
    Multipart,
    /// No request at all: the operation yields a download address.
    Link,
}

/// One row of the endpoint table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: Method,
    /// Path relative to the API root with `{name}` placeholders.
    pub path: &'static str,
    pub body: BodyShape,
    pub fallback: &'static str,
    /// Query parameters sent when the caller leaves them out.
    pub defaults: &'static [(&'static str, &'static str)],
    /// Never attach the bearer credential.
    pub anonymous: bool,
}

const fn row(name: &'static str, method: Method, path: &'static str, body: BodyShape) -> Endpoint {
    Endpoint {
        name,
        method,
        path,
        body,
        fallback: DEFAULT_FALLBACK,
        defaults: &[],
        anonymous: false,
    }
}

const fn get(name: &'static str, path: &'static str) -> Endpoint {
    row(name, Method::Get, path, BodyShape::Empty)
}

const fn link(name: &'static str, path: &'static str) -> Endpoint {
    row(name, Method::Get, path, BodyShape::Link)
}

macro_rules! operations {
    ($($variant:ident => $endpoint:expr,)*) => {
        /// Named API operations.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant,)*
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)*];

            pub const fn endpoint(self) -> Endpoint {
                match self {
                    $(Operation::$variant => $endpoint,)*
                }
            }
        }
    };
}

operations! {
    // Dashboard
    DashboardOverview => get("dashboard_overview", "/dashboard/overview"),
    RecentEvents => Endpoint {
        defaults: &[("limit", "10")],
        ..get("recent_events", "/dashboard/recent-events")
    },
    EventTimeline => Endpoint {
        defaults: &[("days", "30")],
        ..get("event_timeline", "/dashboard/timeline")
    },
    TopFacilities => Endpoint {
        defaults: &[("limit", "5")],
        ..get("top_facilities", "/dashboard/top-facilities")
    },
    SpeciesDistribution => get("species_distribution", "/dashboard/species-distribution"),

    // Animals
    ListAnimals => get("list_animals", "/animals/"),
    GetAnimal => get("get_animal", "/animals/{id}"),
    CreateAnimal => row("create_animal", Method::Post, "/animals/", BodyShape::Json),
    UpdateAnimal => row("update_animal", Method::Put, "/animals/{id}", BodyShape::Json),
    DeleteAnimal => row("delete_animal", Method::Delete, "/animals/{id}", BodyShape::Empty),
    AnimalEvents => get("animal_events", "/animals/{id}/events"),
    AnimalSpecies => get("animal_species", "/animals/species/"),
    AnimalStats => get("animal_stats", "/animals/stats/"),
    TransferAnimal =>
        row("transfer_animal", Method::Post, "/animals/{id}/transfer", BodyShape::Json),
    MovementHistory => get("movement_history", "/animals/{id}/movement-history"),

    // Breeds
    BreedSpecies => get("breed_species", "/breeds/species"),
    ListBreeds => get("list_breeds", "/breeds/breeds"),
    BreedCountries => get("breed_countries", "/breeds/countries"),
    BreedDetails => get("breed_details", "/breeds/breeds/{id}"),

    // Facilities
    ListFacilities => get("list_facilities", "/facilities/"),
    GetFacility => get("get_facility", "/facilities/{id}"),
    CreateFacility => row("create_facility", Method::Post, "/facilities/", BodyShape::Json),
    UpdateFacility => row("update_facility", Method::Put, "/facilities/{id}", BodyShape::Json),
    DeleteFacility => row("delete_facility", Method::Delete, "/facilities/{id}", BodyShape::Empty),
    FacilityAnimals => get("facility_animals", "/facilities/{id}/animals"),
    FacilityStats => get("facility_stats", "/facilities/{id}/stats"),
    FacilityTypes => get("facility_types", "/facilities/types"),

    // Events
    ListEvents => get("list_events", "/events/"),
    GetEvent => get("get_event", "/events/{id}"),
    CreateEvent => row("create_event", Method::Post, "/events/", BodyShape::Json),
    EventTypes => get("event_types", "/events/types"),
    Anomalies => get("anomalies", "/events/anomalies"),
    EventStats => get("event_stats", "/events/stats"),

    // Users
    ListUsers => get("list_users", "/users/"),
    GetUser => get("get_user", "/users/{id}"),
    CreateUser => row("create_user", Method::Post, "/users/", BodyShape::Json),
    UpdateUser => row("update_user", Method::Put, "/users/{id}", BodyShape::Json),
    DeleteUser => row("delete_user", Method::Delete, "/users/{id}", BodyShape::Empty),

    // Auth
    Login => Endpoint {
        fallback: "Invalid credentials",
        anonymous: true,
        ..row("login", Method::Post, "/auth/login", BodyShape::Form)
    },
    Register => Endpoint {
        fallback: "Registration failed",
        anonymous: true,
        ..row("register", Method::Post, "/auth/register", BodyShape::Json)
    },
    CurrentUser => get("current_user", "/auth/me"),
    ForgotPassword =>
        row("forgot_password", Method::Post, "/auth/forgot-password", BodyShape::Json),
    ResetPassword => row("reset_password", Method::Post, "/auth/reset-password", BodyShape::Json),

    // Documents
    UploadDocument => Endpoint {
        fallback: "Upload failed",
        ..row("upload_document", Method::Post, "/animals/{id}/documents", BodyShape::Multipart)
    },
    AnimalDocuments => get("animal_documents", "/animals/{id}/documents"),
    GetDocument => get("get_document", "/documents/{id}"),
    DeleteDocument => row("delete_document", Method::Delete, "/documents/{id}", BodyShape::Empty),
    DocumentTypes => get("document_types", "/documents/types"),

    // Settings, keyed by the `username` query parameter
    GetProfile => get("get_profile", "/settings/profile"),
    UpdateProfile => row("update_profile", Method::Put, "/settings/profile", BodyShape::Json),
    GetAccount => get("get_account", "/settings/account"),
    UpdateAccount => row("update_account", Method::Put, "/settings/account", BodyShape::Json),
    GetNotifications => get("get_notifications", "/settings/notifications"),
    UpdateNotifications =>
        row("update_notifications", Method::Put, "/settings/notifications", BodyShape::Json),
    ChangePassword => row("change_password", Method::Post, "/settings/password", BodyShape::Json),

    // Reports
    AnimalReport => link("animal_report", "/reports/animals/{id}/pdf"),
    ComplianceReport => link("compliance_report", "/reports/compliance/pdf"),
    AuditLogReport => link("audit_log_report", "/reports/audit-logs/pdf"),
}

impl Operation {
    /// Look an operation up by its table name.
    pub fn from_name(name: &str) -> Option<Operation> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.endpoint().name == name)
    }

    pub fn name(self) -> &'static str {
        self.endpoint().name
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments for one invocation of an [`Operation`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Call {
    params: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    body: RequestBody,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill a `{name}` placeholder in the path template.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn queries<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }
}

impl Endpoint {
    /// Expand the path template and append the query string.
    pub fn render(&self, call: &Call) -> Result<String> {
        let mut path = String::with_capacity(self.path.len());
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            path.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                HttpError::Config(format!("Unterminated placeholder in {}", self.path))
            })?;
            let name = &after[..end];
            let value = call
                .params
                .get(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| HttpError::MissingPathParam(name.to_string()))?;
            path.extend(utf8_percent_encode(value, PATH_SEGMENT));
            rest = &after[end + 1..];
        }
        path.push_str(rest);

        let mut pairs: Vec<(&str, &str)> = call
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for &(k, v) in self.defaults {
            if !call.query.iter().any(|(name, _)| name == k) {
                pairs.push((k, v));
            }
        }

        if !pairs.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            path.push('?');
            path.push_str(&query);
        }
        Ok(path)
    }

    /// Build the dispatch request for this row.
    pub fn request(&self, call: Call) -> Result<DispatchRequest> {
        let endpoint = self.render(&call)?;
        if self.body == BodyShape::Multipart && !matches!(call.body, RequestBody::Multipart(_)) {
            return Err(HttpError::Multipart(format!(
                "{} requires a multipart body",
                self.name
            )));
        }
        let mut request = DispatchRequest::new(endpoint)
            .with_method(self.method)
            .with_body(call.body);
        if self.anonymous {
            request = request.anonymous();
        }
        Ok(request)
    }
}
