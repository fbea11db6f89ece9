// Host endpoints
//
// Hosts are top-level resources under `/api/beta/hosts`. Connectors listed
// in a create request are provisioned server-side in the same call; updates
// only touch the host's own fields.

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::transport::Transport;
use crate::types::{CreateHostRequest, Host, UpdateHostRequest};

impl<T: Transport> Client<T> {
    /// Fetch a host by id.
    ///
    /// `GET /hosts/{id}`
    pub async fn get_host(&self, host_id: &str) -> Result<Host, Error> {
        debug!(host_id, "fetching host");
        self.get(&["hosts", host_id]).await
    }

    /// Create a host together with its initial connectors.
    ///
    /// `POST /hosts`
    pub async fn create_host(&self, request: &CreateHostRequest) -> Result<Host, Error> {
        debug!(name = %request.name, connectors = request.connectors.len(), "creating host");
        self.post(&["hosts"], request).await
    }

    /// Replace a host's mutable fields.
    ///
    /// `PUT /hosts/{id}`
    pub async fn update_host(
        &self,
        host_id: &str,
        request: &UpdateHostRequest,
    ) -> Result<Host, Error> {
        debug!(host_id, "updating host");
        self.put(&["hosts", host_id], request).await
    }

    /// Delete a host. The response body is ignored.
    ///
    /// `DELETE /hosts/{id}`
    pub async fn delete_host(&self, host_id: &str) -> Result<(), Error> {
        debug!(host_id, "deleting host");
        self.delete(&["hosts", host_id]).await
    }
}
