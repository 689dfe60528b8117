//! Address book (通讯录) endpoints
//!
//! A thin layer over `HttpClient`: each method builds one `Operation`,
//! dispatches it, and turns a non-zero `errcode` into `Error::Api`.
//!
//! ```rust,ignore
//! let client = HttpClient::new(ClientConfig::new("ww123", "secret"))?;
//! let user = client.address_book().get_member("zhangsan").await?;
//! ```

mod types;

pub use types::{
    Attr, Department, ExtAttr, ExternalAttr, ExternalProfile, InviteResult, MiniProgram,
    TextValue, User, WebLink,
};

use crate::error::Result;
use crate::http::{decode_payload, Envelope, HttpClient, Operation};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use types::{DepartmentList, InviteRequest};

const PATH_USER_CREATE: &str = "/cgi-bin/user/create";
const PATH_USER_GET: &str = "/cgi-bin/user/get";
const PATH_USER_UPDATE: &str = "/cgi-bin/user/update";
const PATH_USER_DELETE: &str = "/cgi-bin/user/delete";
const PATH_USER_INVITE: &str = "/cgi-bin/batch/invite";
const PATH_DEPARTMENT_LIST: &str = "/cgi-bin/department/list";

/// Address book operations bound to a client
#[derive(Debug, Clone)]
pub struct AddressBook<'a> {
    client: &'a HttpClient,
    cancel: Option<CancellationToken>,
}

impl<'a> AddressBook<'a> {
    /// Create an address book view over `client`
    pub fn new(client: &'a HttpClient) -> Self {
        Self {
            client,
            cancel: None,
        }
    }

    /// Abandon calls made through the returned view once `cancel` fires
    #[must_use]
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            client: self.client,
            cancel: Some(cancel),
        }
    }

    /// Create a member
    pub async fn create_member(&self, user: &User) -> Result<()> {
        let operation = Operation::post(PATH_USER_CREATE).json_from(user)?;
        self.call::<Envelope>(operation).await.map(drop)
    }

    /// Read a single member
    pub async fn get_member(&self, userid: &str) -> Result<User> {
        self.call(Operation::post(PATH_USER_GET).query("userid", userid))
            .await
    }

    /// Update a member; only the fields that are set are changed
    pub async fn update_member(&self, user: &User) -> Result<()> {
        let operation = Operation::post(PATH_USER_UPDATE).json_from(user)?;
        self.call::<Envelope>(operation).await.map(drop)
    }

    /// Delete a member
    pub async fn delete_member(&self, userid: &str) -> Result<()> {
        self.call::<Envelope>(Operation::post(PATH_USER_DELETE).query("userid", userid))
            .await
            .map(drop)
    }

    /// Invite members to join
    pub async fn invite_members(&self, userids: &[String]) -> Result<InviteResult> {
        let operation =
            Operation::post(PATH_USER_INVITE).json_from(&InviteRequest { user: userids })?;
        self.call(operation).await
    }

    /// List a department and its sub-departments
    pub async fn department_list(&self, department_id: i64) -> Result<Vec<Department>> {
        let list: DepartmentList = self
            .call(Operation::get(PATH_DEPARTMENT_LIST).query("id", department_id.to_string()))
            .await?;
        Ok(list.department)
    }

    async fn call<T: DeserializeOwned>(&self, operation: Operation) -> Result<T> {
        let body = match &self.cancel {
            Some(cancel) => self.client.execute_raw_with_cancel(operation, cancel).await?,
            None => self.client.execute_raw(operation).await?,
        };
        Envelope::decode(&body)?.into_result()?;
        decode_payload(&body)
    }
}

impl HttpClient {
    /// Address book operations on this client
    pub fn address_book(&self) -> AddressBook<'_> {
        AddressBook::new(self)
    }
}
