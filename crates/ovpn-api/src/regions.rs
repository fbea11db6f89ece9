// Region endpoints

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::transport::Transport;
use crate::types::Region;

impl<T: Transport> Client<T> {
    /// List every region connectors can be deployed to, in server order.
    ///
    /// `GET /regions`
    pub async fn list_regions(&self) -> Result<Vec<Region>, Error> {
        debug!("listing regions");
        self.get(&["regions"]).await
    }
}
