use anyhow::Context;
use fpvcore::interface::{AlertSink, PublishError};
use zeromq::{PubSocket, Socket, SocketSend, ZmqMessage};

/// PUB socket that carries each alert as one JSON text frame.
pub struct ZmqPublisher {
    socket: PubSocket,
    endpoint: String,
}

impl ZmqPublisher {
    pub async fn bind(endpoint: &str) -> anyhow::Result<Self> {
        let mut socket = PubSocket::new();
        socket
            .bind(endpoint)
            .await
            .with_context(|| format!("binding alert publisher on {}", endpoint))?;
        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AlertSink for ZmqPublisher {
    async fn send(&mut self, payload: String) -> Result<(), PublishError> {
        self.socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(|err| PublishError::Send(err.to_string()))
    }
}
