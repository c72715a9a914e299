use doctor_core::ChannelMessage;
use futures::{StreamExt as _, stream::BoxStream};
use tracing::info;

/// Subscribes to `channel` on the NATS server at `url` and yields every
/// delivered message. The initial connection is retried until it succeeds.
pub async fn subscribe(
    url: &str,
    channel: &str,
) -> Result<BoxStream<'static, ChannelMessage>, async_nats::Error> {
    let client = async_nats::ConnectOptions::new()
        .retry_on_initial_connect()
        .connect(url)
        .await?;
    let subscriber = client.subscribe(channel.to_owned()).await?;
    info!(url, channel, "subscribed to event channel");

    Ok(subscriber
        .map(move |message| {
            // Holding the client keeps the connection open for the stream's lifetime.
            let _client = &client;
            ChannelMessage::new(message.subject.as_str(), message.payload.to_vec())
        })
        .boxed())
}
