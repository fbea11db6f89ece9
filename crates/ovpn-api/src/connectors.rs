// Connector endpoints
//
// Connectors always belong to a network item. Mutating calls identify the
// parent through `networkItemId` / `networkItemType` query parameters; the
// JSON body carries only the connector's own fields.

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::transport::Transport;
use crate::types::{Connector, ConnectorData, ConnectorRequest, NetworkItemType};

/// Query parameters naming a connector's parent.
fn parent_params(network_item_id: &str, network_item_type: NetworkItemType) -> [(&str, &str); 2] {
    [
        ("networkItemId", network_item_id),
        ("networkItemType", network_item_type.as_str()),
    ]
}

impl<T: Transport> Client<T> {
    /// Fetch a connector by id.
    ///
    /// `GET /connectors/{id}`
    pub async fn get_connector(&self, connector_id: &str) -> Result<Connector, Error> {
        debug!(connector_id, "fetching connector");
        self.get(&["connectors", connector_id]).await
    }

    /// Generate the connector's client profile and return it verbatim.
    ///
    /// `POST /connectors/{id}/profile` with an empty body. The response is
    /// plain text, not JSON; it must be valid UTF-8.
    pub async fn get_connector_profile(&self, connector_id: &str) -> Result<String, Error> {
        debug!(connector_id, "fetching connector profile");
        let bytes = self.post_for_bytes(&["connectors", connector_id, "profile"]).await?;
        String::from_utf8(bytes).map_err(|e| Error::Deserialization {
            message: format!("connector profile is not valid UTF-8: {}", e.utf8_error()),
            body: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Create a connector under the network item named in `data`.
    ///
    /// `POST /connectors?networkItemId=..&networkItemType=..`
    pub async fn create_connector(&self, data: &ConnectorData) -> Result<Connector, Error> {
        debug!(
            network_item_id = %data.network_item_id,
            network_item_type = %data.network_item_type,
            "creating connector"
        );
        let params = parent_params(&data.network_item_id, data.network_item_type);
        self.post_with_params(&["connectors"], &params, &ConnectorRequest::from(data))
            .await
    }

    /// Update a connector's name, description, and region.
    ///
    /// `PUT /connectors/{id}?networkItemId=..&networkItemType=..`
    pub async fn update_connector(
        &self,
        connector_id: &str,
        data: &ConnectorData,
    ) -> Result<Connector, Error> {
        debug!(connector_id, "updating connector");
        let params = parent_params(&data.network_item_id, data.network_item_type);
        self.put_with_params(
            &["connectors", connector_id],
            &params,
            &ConnectorRequest::from(data),
        )
        .await
    }

    /// Delete a connector from its parent network item.
    ///
    /// `DELETE /connectors/{id}?networkItemId=..&networkItemType=..`
    pub async fn delete_connector(
        &self,
        connector_id: &str,
        network_item_id: &str,
        network_item_type: NetworkItemType,
    ) -> Result<(), Error> {
        debug!(connector_id, network_item_id, "deleting connector");
        let params = parent_params(network_item_id, network_item_type);
        self.delete_with_params(&["connectors", connector_id], &params)
            .await
    }
}
