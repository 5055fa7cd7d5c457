//! Agent lifecycle, tools, one-shot generation, and chat management.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::*;
use genaiclient::error::{ErrorKind, GenaiError};
use genaiclient::prelude::*;
use genaiclient::wire::GenerateContentResponse;

async fn new_agent(client: &GenaiClient) -> Agent {
    client
        .new_agent(
            AgentConfig::builder()
                .persona("You are a travel planner.")
                .system_instruction("Keep answers short.")
                .build(),
        )
        .await
        .expect("agent")
}

#[tokio::test]
async fn new_agent_fills_defaults_and_persists() {
    let (client, _inference) = mock_client();
    let agent = new_agent(&client).await;

    assert!(!agent.id().is_empty());
    assert_eq!(agent.config().default_model, "gemini-2.5-flash-lite");
    assert_eq!(
        agent
            .config()
            .default_generation_config
            .as_ref()
            .and_then(|c| c.temperature),
        Some(0.01)
    );

    let loaded = client.get_agent(agent.id()).await.expect("load");
    assert_eq!(loaded.config(), agent.config());
    let listed = client.list_agents().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, agent.id());
}

#[tokio::test]
async fn explicit_agent_id_and_model_are_kept() {
    let (client, _inference) = mock_client();
    let agent = client
        .new_agent(
            AgentConfig::builder()
                .id("planner")
                .default_model("gemini-2.5-pro")
                .default_generation_config(GenerationConfig::builder().temperature(0.7).build())
                .build(),
        )
        .await
        .expect("agent");

    assert_eq!(agent.id(), "planner");
    assert_eq!(agent.config().default_model, "gemini-2.5-pro");
    assert_eq!(
        agent
            .config()
            .default_generation_config
            .as_ref()
            .and_then(|c| c.temperature),
        Some(0.7)
    );
}

#[tokio::test]
async fn removed_agent_is_not_found() {
    let (client, _inference) = mock_client();
    let agent = new_agent(&client).await;

    client.remove_agent(agent.id()).await.expect("remove");

    let err = client.get_agent(agent.id()).await.expect_err("gone");
    assert!(matches!(err, GenaiError::AgentNotFound(id) if id == agent.id()));
    assert!(client.list_agents().await.expect("list").is_empty());
}

#[tokio::test]
async fn generate_includes_user_context() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    client
        .set_user_context("user-1", "Prefers trains over planes.")
        .await
        .expect("user context");
    inference.queue_text("  Take the night train.  ");

    let reply = agent
        .generate("user-1", &"Paris to Vienna?".into(), None)
        .await
        .expect("generate");
    assert_eq!(reply.text(), "Take the night train.");

    let request = inference.last_request();
    assert_eq!(request.contents.len(), 1);
    let instruction = request.config.system_instruction.expect("instruction");
    let parts: Vec<&str> = instruction
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    assert_eq!(
        parts,
        vec![
            "You are a travel planner.",
            "Keep answers short.",
            "User Context: Prefers trains over planes.",
        ]
    );
}

#[tokio::test]
async fn generate_without_known_user_has_no_context() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    inference.queue_text("ok");

    agent
        .generate("stranger", &"Hello".into(), None)
        .await
        .expect("generate");

    let instruction = inference
        .last_request()
        .config
        .system_instruction
        .expect("instruction");
    assert_eq!(instruction.parts.len(), 2);
}

#[tokio::test]
async fn generate_does_not_touch_history() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    let chat = agent
        .new_chat(ChatConfig::builder().user_id("user-1").build())
        .await
        .expect("chat");
    inference.queue_text("ok");

    agent
        .generate("user-1", &"Hello".into(), None)
        .await
        .expect("generate");

    assert!(chat.history().await.expect("history").is_empty());
}

#[tokio::test]
async fn invalid_tool_mode_fails_before_any_call() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;

    let config = GenerationConfig::builder()
        .tool_config(ToolConfig::new("SOMETIMES"))
        .build();
    let err = agent
        .generate("user-1", &"Hello".into(), Some(&config))
        .await
        .expect_err("invalid mode");

    assert_eq!(err.kind(), ErrorKind::ConfigConversion);
    assert_eq!(err.root().kind(), ErrorKind::InvalidMode);
    assert_eq!(inference.call_count(), 0);
}

#[tokio::test]
async fn response_without_candidates_is_empty_response() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    inference.queue_response(Ok(GenerateContentResponse::default()));

    let err = agent
        .generate("user-1", &"Hello".into(), None)
        .await
        .expect_err("empty");
    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
}

#[tokio::test]
async fn generate_structured_sends_schema_and_parses() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Trip {
        from: String,
        to: String,
        nights: u32,
        notes: Option<String>,
    }

    impl genaiclient::adapter::SchemaType for Trip {
        fn schema() -> Schema {
            Schema::object()
                .field::<String>("from")
                .field::<String>("to")
                .field::<u32>("nights")
                .field::<Option<String>>("notes")
                .build()
        }
    }

    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    inference.queue_text(r#"{"from": "Paris", "to": "Vienna", "nights": 3}"#);

    let trip: Trip = agent
        .generate_structured("user-1", &"Plan a trip".into(), None)
        .await
        .expect("structured");
    assert_eq!(
        trip,
        Trip {
            from: "Paris".to_string(),
            to: "Vienna".to_string(),
            nights: 3,
            notes: None,
        }
    );

    let schema = inference
        .last_request()
        .config
        .response_schema
        .expect("schema");
    assert_eq!(schema.required, vec!["from", "to", "nights"]);
    assert_eq!(schema.property_ordering, vec!["from", "to", "nights", "notes"]);
}

#[tokio::test]
async fn structured_reply_that_is_not_json_fails() {
    #[derive(Debug, serde::Deserialize)]
    struct Answer {
        #[allow(dead_code)]
        value: i64,
    }

    impl genaiclient::adapter::SchemaType for Answer {
        fn schema() -> Schema {
            Schema::object().field::<i64>("value").build()
        }
    }

    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    inference.queue_text("forty-two");

    let err = agent
        .generate_structured::<Answer>("user-1", &"?".into(), None)
        .await
        .expect_err("not json");
    assert_eq!(err.kind(), ErrorKind::Serialization);
}

#[tokio::test]
async fn tools_are_added_replaced_and_removed() {
    let (client, _inference) = mock_client();
    let mut agent = new_agent(&client).await;

    agent
        .add_tool(Tool::new("book_train", "Book a train"))
        .await
        .expect("add");
    agent
        .add_tool(Tool::new("find_hotel", "Find a hotel"))
        .await
        .expect("add");
    agent
        .add_tool(Tool::new("book_train", "Book a train ticket"))
        .await
        .expect("replace");

    let names: Vec<&str> = agent.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["book_train", "find_hotel"]);
    assert_eq!(agent.tools()[0].description, "Book a train ticket");

    agent.remove_tool("find_hotel").await.expect("remove");
    let err = agent.remove_tool("find_hotel").await.expect_err("missing");
    assert!(matches!(err, GenaiError::ToolNotFound(name) if name == "find_hotel"));

    let reloaded = client.get_agent(agent.id()).await.expect("reload");
    assert_eq!(reloaded.tools().len(), 1);
    assert_eq!(reloaded.tools()[0].name, "book_train");
}

#[tokio::test]
async fn tools_reach_the_wire_with_tool_config() {
    let (client, inference) = mock_client();
    let mut agent = new_agent(&client).await;
    agent
        .add_tool(Tool::new("book_train", "Book a train").with_request(
            SchemaConfig::from_json(
                json!({"type": "object", "properties": {"date": {"type": "string"}}})
                    .as_object()
                    .cloned()
                    .expect("object"),
            ),
        ))
        .await
        .expect("add");
    inference.queue_text("ok");

    let config = GenerationConfig::builder()
        .tool_config(ToolConfig::new("any").with_allowed_tools(["book_train"]))
        .build();
    agent
        .generate("user-1", &"Book it".into(), Some(&config))
        .await
        .expect("generate");

    let wire = inference.last_request().config;
    assert_eq!(wire.tools.len(), 1);
    let declaration = &wire.tools[0].function_declarations[0];
    assert_eq!(declaration.description, "Book a train");
    assert!(declaration.parameters.is_some());
    let calling = wire
        .tool_config
        .and_then(|c| c.function_calling_config)
        .expect("calling config");
    assert_eq!(calling.allowed_function_names, vec!["book_train"]);
}

#[tokio::test]
async fn chat_inherits_and_overrides_agent_defaults() {
    let (client, inference) = mock_client();
    let agent = client
        .new_agent(
            AgentConfig::builder()
                .default_generation_config(
                    GenerationConfig::builder()
                        .temperature(0.3)
                        .max_output_tokens(256)
                        .build(),
                )
                .build(),
        )
        .await
        .expect("agent");

    let chat = agent
        .new_chat(
            ChatConfig::builder()
                .user_id("user-1")
                .model("gemini-2.5-pro")
                .generation_config(GenerationConfig::builder().temperature(0.8).build())
                .build(),
        )
        .await
        .expect("chat");

    assert_eq!(chat.agent_id(), agent.id());
    assert_eq!(chat.model(), "gemini-2.5-pro");
    assert_eq!(chat.generation_config().temperature, Some(0.8));
    assert_eq!(chat.generation_config().max_output_tokens, 256);

    inference.queue_text("ok");
    chat.send_message(&"hi".into(), None).await.expect("send");
    let request = inference.last_request();
    assert_eq!(request.model, "gemini-2.5-pro");
    assert_eq!(request.config.temperature, Some(0.8));
    assert_eq!(request.config.max_output_tokens, Some(256));
}

#[tokio::test]
async fn chats_are_scoped_to_their_agent() {
    let (client, _inference) = mock_client();
    let first = new_agent(&client).await;
    let second = new_agent(&client).await;

    let chat = first
        .new_chat(ChatConfig::builder().user_id("user-1").build())
        .await
        .expect("chat");

    assert!(first.get_chat(chat.id()).await.is_ok());
    let err = second.get_chat(chat.id()).await.expect_err("other agent");
    assert!(matches!(err, GenaiError::ChatNotFound(_)));
    let err = second.remove_chat(chat.id()).await.expect_err("other agent");
    assert!(matches!(err, GenaiError::ChatNotFound(_)));
    let err = first.get_chat("missing").await.expect_err("missing");
    assert!(matches!(err, GenaiError::ChatNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn list_chats_hides_background_and_other_users() {
    let (client, _inference) = mock_client();
    let agent = new_agent(&client).await;

    for (user, chat_type) in [
        ("user-1", ChatType::Conversational),
        ("user-1", ChatType::Conversational),
        ("user-1", ChatType::Background),
        ("user-2", ChatType::Conversational),
    ] {
        agent
            .new_chat(
                ChatConfig::builder()
                    .user_id(user)
                    .chat_type(chat_type)
                    .build(),
            )
            .await
            .expect("chat");
    }

    let chats = agent.list_chats("user-1").await.expect("list");
    assert_eq!(chats.len(), 2);
    assert!(chats
        .iter()
        .all(|c| c.user_id == "user-1" && c.chat_type == ChatType::Conversational));
}

#[tokio::test]
async fn removed_chat_loses_its_history() {
    let (client, inference) = mock_client();
    let agent = new_agent(&client).await;
    let chat = agent
        .new_chat(ChatConfig::builder().id("trip-1").user_id("user-1").build())
        .await
        .expect("chat");
    inference.queue_text("ok");
    chat.send_message(&"hi".into(), None).await.expect("send");

    agent.remove_chat("trip-1").await.expect("remove");

    let err = agent.get_chat("trip-1").await.expect_err("removed");
    assert!(matches!(err, GenaiError::ChatNotFound(_)));
    assert!(client
        .store()
        .chat_history("trip-1")
        .await
        .expect("history")
        .is_empty());
}

#[tokio::test]
async fn agents_work_without_persistence() {
    let inference = MockInference::new();
    let client = client_with(inference.clone(), Store::disabled());
    let agent = new_agent(&client).await;
    let chat = agent
        .new_chat(ChatConfig::builder().user_id("user-1").build())
        .await
        .expect("chat");
    inference.queue_text("ok");

    let reply = chat.send_message(&"hi".into(), None).await.expect("send");
    assert_eq!(reply.text(), "ok");
    assert!(chat.history().await.expect("history").is_empty());
    assert!(matches!(
        client.get_agent(agent.id()).await,
        Err(GenaiError::AgentNotFound(_))
    ));
}
