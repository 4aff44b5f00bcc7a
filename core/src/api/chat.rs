use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{Conversation, ConversationCreate, ConversationDetail, ContextType};
use crate::stream::{read_event_stream, ChatEvent, ChatStreamHandler, StreamOutcome};
use crate::transport::{HttpRequest, RequestBody};
use reqwest::Method;
use serde_json::json;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub context_type: Option<ContextType>,
    pub context_analysis_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ApiClient {
    pub async fn create_conversation(
        &self,
        conversation: &ConversationCreate,
    ) -> Result<Conversation, ApiError> {
        self.request(
            ApiRequest::post("/chat/conversations").json(serde_json::to_value(conversation)?),
        )
        .await
    }

    pub async fn get_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, ApiError> {
        self.request(
            ApiRequest::get("/chat/conversations")
                .query_opt("context_type", filter.context_type.map(ContextType::as_str))
                .query_opt("context_analysis_id", filter.context_analysis_id.as_deref())
                .query_opt("page", filter.page)
                .query_opt("page_size", filter.page_size),
        )
        .await
    }

    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetail, ApiError> {
        self.request(ApiRequest::get("/chat/conversations").segment(conversation_id))
            .await
    }

    pub async fn create_conversation_from_analysis_result(
        &self,
        analysis_result_id: &str,
    ) -> Result<Conversation, ApiError> {
        self.request(
            ApiRequest::post("/chat/analysis-results")
                .segment(analysis_result_id)
                .segment("conversation"),
        )
        .await
    }

    /// Post a user message and stream the assistant reply into `handler`.
    ///
    /// Failures, including non-success statuses, are delivered through
    /// `on_error` rather than returned.
    pub async fn send_message<H>(
        &self,
        conversation_id: &str,
        content: &str,
        handler: &mut H,
    ) -> StreamOutcome
    where
        H: ChatStreamHandler + ?Sized,
    {
        let request = ApiRequest::post("/chat/conversations")
            .segment(conversation_id)
            .segment("messages");
        let url = match self.url_for(&request) {
            Ok(url) => url,
            Err(err) => {
                handler.on_error(&err.to_string());
                return StreamOutcome::Failed;
            }
        };
        let mut http = HttpRequest::new(Method::POST, url);
        http.body = RequestBody::Json(json!({ "content": content }));
        self.session().authorize(&mut http);

        let response = match self.transport().open_stream(http).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, conversation_id, "failed to open chat stream");
                handler.on_error(&err.to_string());
                return StreamOutcome::Failed;
            }
        };
        if !(200..300).contains(&response.status) {
            warn!(status = response.status, conversation_id, "chat stream rejected");
            handler.on_error(&format!("chat request failed with HTTP status {}", response.status));
            return StreamOutcome::Failed;
        }

        let outcome = read_event_stream(response.body, handler).await;
        info!(conversation_id, ?outcome, "chat stream finished");
        outcome
    }

    /// Channel flavour of [`send_message`](Self::send_message): the reply is
    /// read on a spawned task and each event is forwarded in order. The
    /// channel closes after the terminal event.
    pub fn send_message_streaming(
        &self,
        conversation_id: impl Into<String>,
        content: impl Into<String>,
    ) -> UnboundedReceiver<ChatEvent> {
        let (tx, rx) = unbounded_channel();
        let client = self.clone();
        let conversation_id = conversation_id.into();
        let content = content.into();
        tokio::spawn(async move {
            let mut forwarder = ChannelHandler { tx };
            client
                .send_message(&conversation_id, &content, &mut forwarder)
                .await;
        });
        rx
    }
}

struct ChannelHandler {
    tx: UnboundedSender<ChatEvent>,
}

impl ChatStreamHandler for ChannelHandler {
    fn on_start(&mut self) {
        self.tx.send(ChatEvent::Start).ok();
    }

    fn on_chunk(&mut self, content: &str) {
        self.tx
            .send(ChatEvent::Chunk {
                content: content.to_owned(),
            })
            .ok();
    }

    fn on_done(&mut self) {
        self.tx.send(ChatEvent::Done).ok();
    }

    fn on_error(&mut self, message: &str) {
        self.tx
            .send(ChatEvent::Error {
                message: message.to_owned(),
            })
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{scripted_client, CREATED_AT};
    use crate::error::TransportError;
    use crate::events::drain;
    use crate::stream::EventLog;

    #[tokio::test]
    async fn streams_reply_with_bearer_token() {
        let (client, transport, mut rx) = scripted_client();
        client.session().set_token("jwt").unwrap();
        transport.push_stream(
            200,
            [
                "data: {\"type\": \"start\"}\n\n",
                "data: {\"type\": \"chunk\", \"content\": \"Reads \"}\n\n",
                "data: {\"type\": \"chunk\", \"content\": \"dropped 30%\"}\n\n",
                "data: {\"type\": \"done\"}\n\n",
            ],
        );
        let mut log = EventLog::default();

        let outcome = client.send_message("c1", "why?", &mut log).await;
        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(log.text(), "Reads dropped 30%");

        let sent = &transport.requests()[0];
        assert_eq!(sent.url.path(), "/api/v1/chat/conversations/c1/messages");
        assert_eq!(sent.header("Authorization"), Some("Bearer jwt"));
        assert_eq!(sent.timeout, None);
        match &sent.body {
            RequestBody::Json(body) => assert_eq!(body, &json!({"content": "why?"})),
            other => panic!("unexpected body {other:?}"),
        }
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn rejected_stream_reports_status_through_handler() {
        let (client, transport, _rx) = scripted_client();
        transport.push_json(500, json!({"detail": "boom"}));
        let mut log = EventLog::default();

        let outcome = client.send_message("c1", "hi", &mut log).await;
        assert_eq!(outcome, StreamOutcome::Failed);
        assert_eq!(
            log.events,
            vec![ChatEvent::Error {
                message: "chat request failed with HTTP status 500".into()
            }]
        );
    }

    #[tokio::test]
    async fn network_failure_is_not_retried_for_streams() {
        let (client, transport, _rx) = scripted_client();
        transport
            .push_failure(TransportError::Timeout)
            .push_stream(200, ["data: {\"type\": \"done\"}\n"]);
        let mut log = EventLog::default();

        assert_eq!(
            client.send_message("c1", "hi", &mut log).await,
            StreamOutcome::Failed
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn channel_variant_forwards_events_then_closes() {
        let (client, transport, _rx) = scripted_client();
        transport.push_stream(
            200,
            [
                "data: {\"type\": \"chunk\", \"content\": \"a\"}\n",
                "data: {\"type\": \"chunk\", \"content\": \"b\"}\n",
                "data: {\"type\": \"done\"}\n",
                "data: {\"type\": \"chunk\", \"content\": \"ignored\"}\n",
            ],
        );

        let mut events = client.send_message_streaming("c1", "hi");
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                ChatEvent::Chunk { content: "a".into() },
                ChatEvent::Chunk { content: "b".into() },
                ChatEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn conversation_filters_become_query_params() {
        let (client, transport, _rx) = scripted_client();
        transport.push_json(200, json!({"code": 200, "data": [{
            "id": "c1", "title": "March review", "context_type": "analysis",
            "context_analysis_id": "a1", "created_at": CREATED_AT,
            "updated_at": CREATED_AT, "message_count": 4
        }]}));

        let conversations = client
            .get_conversations(&ConversationFilter {
                context_type: Some(ContextType::Analysis),
                context_analysis_id: Some("a1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(conversations[0].message_count, Some(4));
        assert_eq!(
            transport.requests()[0].url.query(),
            Some("context_type=analysis&context_analysis_id=a1")
        );
    }

    #[tokio::test]
    async fn conversation_from_analysis_result_route() {
        let (client, transport, _rx) = scripted_client();
        transport.push_json(200, json!({"code": 200, "data": {
            "id": "c2", "context_type": "analysis_result",
            "context_analysis_result_id": "r1",
            "created_at": CREATED_AT, "updated_at": CREATED_AT
        }}));

        let conversation = client
            .create_conversation_from_analysis_result("r1")
            .await
            .unwrap();
        assert_eq!(conversation.context_type, ContextType::AnalysisResult);
        assert_eq!(
            transport.requests()[0].url.path(),
            "/api/v1/chat/analysis-results/r1/conversation"
        );
    }
}
