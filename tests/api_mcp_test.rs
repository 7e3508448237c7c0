//! Integration tests for the MCP endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::test_utils::{
        FailingCalendar, FakeCalendar, appointment, body_to_string, call_tool, post_mcp, rpc,
        test_app, tool_output,
    };

    const DAY: &str = "2030-06-03";

    fn times(slots: &Value) -> Vec<String> {
        slots
            .as_array()
            .unwrap()
            .iter()
            .map(|slot| slot["time"].as_str().unwrap().to_string())
            .collect()
    }

    /// Tests the handshake reports the tools capability
    #[tokio::test]
    async fn it_initializes() {
        let app = test_app(FakeCalendar::with_events(vec![]));
        let response = rpc(&app, "initialize", json!({})).await;

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert!(response["result"]["protocolVersion"].is_string());
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert_eq!(response["result"]["serverInfo"]["name"], "dental-calendar-mcp");
    }

    #[tokio::test]
    async fn it_answers_ping_and_the_initialized_notification() {
        let app = test_app(FakeCalendar::with_events(vec![]));
        assert_eq!(rpc(&app, "ping", Value::Null).await["result"], json!({}));
        assert_eq!(
            rpc(&app, "notifications/initialized", Value::Null).await["result"],
            json!({})
        );
    }

    /// Tests all six tools are listed with their schemas
    #[tokio::test]
    async fn it_lists_the_tools() {
        let app = test_app(FakeCalendar::with_events(vec![]));
        let response = rpc(&app, "tools/list", json!({})).await;
        let tools = response["result"]["tools"].as_array().unwrap();

        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "check_available_slots",
                "book_appointment",
                "list_appointments",
                "get_appointment_details",
                "cancel_appointment",
                "reschedule_appointment",
            ]
        );

        let book = &tools[1];
        assert_eq!(book["inputSchema"]["type"], "object");
        assert_eq!(
            book["inputSchema"]["required"],
            json!(["patient_name", "patient_email", "date", "time", "appointment_type"])
        );
        assert_eq!(
            book["inputSchema"]["properties"]["patient_phone"]["type"],
            "string"
        );
        assert_eq!(tools[5]["inputSchema"]["required"], json!(["new_date", "new_time"]));
        assert_eq!(tools[4]["inputSchema"]["required"], json!([]));
    }

    #[tokio::test]
    async fn it_rejects_unknown_methods_and_tools() {
        let app = test_app(FakeCalendar::with_events(vec![]));

        let response = rpc(&app, "resources/list", json!({})).await;
        assert_eq!(response["error"]["code"], -32601);

        let response = call_tool(&app, "delete_everything", json!({})).await;
        assert_eq!(response["error"]["code"], -32602);
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn it_rejects_malformed_requests() {
        let app = test_app(FakeCalendar::with_events(vec![]));

        let response = post_mcp(&app, "{not json").await;
        assert_eq!(response["error"]["code"], -32700);

        let response = post_mcp(&app, "[1, 2]").await;
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], Value::Null);

        let response = post_mcp(&app, r#"{"id": 7}"#).await;
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], 7);
    }

    /// Tests the root path also accepts MCP requests
    #[tokio::test]
    async fn it_serves_mcp_on_root() {
        let app = test_app(FakeCalendar::with_events(vec![]));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"method": "ping", "id": "a"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert_eq!(body["id"], "a");
        assert_eq!(body["result"], json!({}));
    }

    #[tokio::test]
    async fn it_returns_every_slot_of_an_empty_day() {
        let app = test_app(FakeCalendar::with_events(vec![]));
        let output = tool_output(&call_tool(&app, "check_available_slots", json!({"date": DAY})).await);

        assert_eq!(output["date"], DAY);
        assert_eq!(output["business_hours"], "09:00 - 17:00");
        let slots = times(&output["available_slots"]);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], "09:00");
        assert_eq!(slots[15], "16:30");
        assert_eq!(
            output["available_slots"][0]["datetime"],
            "2030-06-03T09:00:00+02:00"
        );
    }

    #[tokio::test]
    async fn it_leaves_out_occupied_slots() {
        let calendar = FakeCalendar::with_events(vec![appointment(
            "evt_1",
            "Jansen",
            "jansen@example.com",
            "2030-06-03T10:00:00+02:00",
        )]);
        let app = test_app(calendar);
        let output = tool_output(&call_tool(&app, "check_available_slots", json!({"date": DAY})).await);

        let slots = times(&output["available_slots"]);
        assert_eq!(slots.len(), 15);
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(slots.contains(&"09:30".to_string()));
        assert!(slots.contains(&"10:30".to_string()));
    }

    /// Tests a booked appointment shows up in the listing and details
    #[tokio::test]
    async fn it_books_and_reads_back_an_appointment() {
        let calendar = FakeCalendar::with_events(vec![]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "book_appointment",
                json!({
                    "patient_name": "Sanne Visser",
                    "patient_email": "sanne@example.com",
                    "patient_phone": "0612345678",
                    "date": DAY,
                    "time": "11:30",
                    "appointment_type": "gebitsreiniging",
                }),
            )
            .await,
        );
        assert_eq!(output["success"], true);
        let event_id = output["event_id"].as_str().unwrap().to_string();
        assert_eq!(calendar.writes(), 1);

        let stored = calendar.event(&event_id).unwrap();
        assert_eq!(stored.summary(), "Afspraak - Sanne Visser");
        assert!(stored.description().contains("Type: gebitsreiniging"));
        assert!(stored.description().contains("Telefoon: 0612345678"));
        assert_eq!(
            stored.start.date_time.unwrap().to_rfc3339(),
            "2030-06-03T11:30:00+02:00"
        );
        assert_eq!(
            stored.end.date_time.unwrap().to_rfc3339(),
            "2030-06-03T12:00:00+02:00"
        );
        let reminders = stored.reminders.unwrap();
        assert!(!reminders.use_default);
        assert_eq!(reminders.overrides[0].minutes, 1440);
        assert_eq!(reminders.overrides[1].minutes, 30);

        let listed = tool_output(
            &call_tool(
                &app,
                "list_appointments",
                json!({"start_date": DAY, "end_date": DAY}),
            )
            .await,
        );
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["appointments"][0]["id"], event_id.as_str());

        let details = tool_output(
            &call_tool(&app, "get_appointment_details", json!({"event_id": event_id})).await,
        );
        assert_eq!(details["summary"], "Afspraak - Sanne Visser");
        assert_eq!(details["cancelled"], false);
        assert_eq!(details["attendees"][0]["email"], "sanne@example.com");
    }

    #[tokio::test]
    async fn it_reports_invalid_arguments_as_tool_errors() {
        let calendar = FakeCalendar::with_events(vec![]);
        let app = test_app(calendar.clone());

        let response = call_tool(
            &app,
            "book_appointment",
            json!({
                "patient_name": "Jansen",
                "patient_email": "not-an-email",
                "date": DAY,
                "time": "10:00",
                "appointment_type": "controle",
            }),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("patient_email"));

        let response = call_tool(&app, "check_available_slots", json!({})).await;
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(response["result"]["content"][0]["text"], "date is required");

        // Not on a slot boundary
        let response = call_tool(
            &app,
            "book_appointment",
            json!({
                "patient_name": "Jansen",
                "patient_email": "jansen@example.com",
                "date": DAY,
                "time": "10:15",
                "appointment_type": "controle",
            }),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);

        let response = call_tool(
            &app,
            "list_appointments",
            json!({"start_date": "2030-06-05", "end_date": DAY}),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);

        assert_eq!(calendar.writes(), 0);
    }

    /// Tests cancelling by patient keeps the event and records the reason
    #[tokio::test]
    async fn it_cancels_an_appointment_once() {
        let calendar = FakeCalendar::with_events(vec![appointment(
            "evt_1",
            "Jansen",
            "jansen@example.com",
            "2030-06-03T10:00:00+02:00",
        )]);
        let app = test_app(calendar.clone());

        let args = json!({"patient_name": "jansen", "date": DAY, "reason": "Ziek"});
        let output = tool_output(&call_tool(&app, "cancel_appointment", args.clone()).await);
        assert_eq!(output["success"], true);
        assert_eq!(output["status"], "cancelled");
        assert_eq!(output["event_id"], "evt_1");
        assert_eq!(output["reason"], "Ziek");

        let stored = calendar.event("evt_1").unwrap();
        assert_eq!(stored.summary(), "[GEANNULEERD] Afspraak - Jansen");
        assert!(stored.description().starts_with("Type: controle\nPatiënt: Jansen"));
        assert!(stored.description().ends_with("Reden annulering: Ziek"));
        assert_eq!(calendar.all().len(), 1);
        assert_eq!(calendar.writes(), 1);

        let output = tool_output(&call_tool(&app, "cancel_appointment", args).await);
        assert_eq!(output["success"], false);
        assert_eq!(output["status"], "already_cancelled");
        assert_eq!(calendar.writes(), 1);
        assert_eq!(
            calendar.event("evt_1").unwrap().summary(),
            "[GEANNULEERD] Afspraak - Jansen"
        );

        let details = tool_output(
            &call_tool(&app, "get_appointment_details", json!({"event_id": "evt_1"})).await,
        );
        assert_eq!(details["cancelled"], true);
        assert_eq!(
            details["audit_notes"],
            json!([{"kind": "cancelled", "reason": "Ziek"}])
        );
    }

    #[tokio::test]
    async fn it_cancels_by_event_id_with_the_default_reason() {
        let calendar = FakeCalendar::with_events(vec![appointment(
            "evt_1",
            "Jansen",
            "jansen@example.com",
            "2030-06-03T10:00:00+02:00",
        )]);
        let app = test_app(calendar.clone());

        let output =
            tool_output(&call_tool(&app, "cancel_appointment", json!({"event_id": "evt_1"})).await);
        assert_eq!(output["reason"], "Geannuleerd door patiënt");
        assert!(
            calendar
                .event("evt_1")
                .unwrap()
                .description()
                .ends_with("Reden annulering: Geannuleerd door patiënt")
        );
    }

    /// Tests ambiguous lookups are never resolved by guessing
    #[tokio::test]
    async fn it_asks_which_appointment_when_several_match() {
        let calendar = FakeCalendar::with_events(vec![
            appointment("evt_1", "Jansen", "jansen@example.com", "2030-06-03T10:00:00+02:00"),
            appointment("evt_2", "Jansen", "jansen@example.com", "2030-06-03T14:00:00+02:00"),
        ]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "cancel_appointment",
                json!({"patient_name": "Jansen", "date": DAY}),
            )
            .await,
        );
        assert_eq!(output["success"], false);
        assert_eq!(output["status"], "multiple_matches");
        assert_eq!(output["count"], 2);
        assert_eq!(output["candidates"].as_array().unwrap().len(), 2);

        let output = tool_output(
            &call_tool(
                &app,
                "reschedule_appointment",
                json!({"patient_name": "Jansen", "date": DAY, "new_date": DAY, "new_time": "15:00"}),
            )
            .await,
        );
        assert_eq!(output["status"], "multiple_matches");
        assert_eq!(output["count"], 2);
        assert_eq!(calendar.writes(), 0);

        // A time narrows it down to one
        let output = tool_output(
            &call_tool(
                &app,
                "cancel_appointment",
                json!({"patient_name": "Jansen", "date": DAY, "time": "14:00"}),
            )
            .await,
        );
        assert_eq!(output["status"], "cancelled");
        assert_eq!(output["event_id"], "evt_2");
    }

    #[tokio::test]
    async fn it_reports_a_missing_appointment() {
        let calendar = FakeCalendar::with_events(vec![]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "cancel_appointment",
                json!({"patient_name": "Pietersen", "date": DAY}),
            )
            .await,
        );
        assert_eq!(output["success"], false);
        assert_eq!(output["status"], "not_found");
        assert_eq!(calendar.writes(), 0);
    }

    /// Tests a reschedule into a taken slot is refused with alternatives
    #[tokio::test]
    async fn it_refuses_to_reschedule_into_an_occupied_slot() {
        let calendar = FakeCalendar::with_events(vec![
            appointment("evt_1", "Jansen", "jansen@example.com", "2030-06-03T10:00:00+02:00"),
            appointment("evt_2", "de Vries", "devries@example.com", "2030-06-03T11:00:00+02:00"),
        ]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "reschedule_appointment",
                json!({"event_id": "evt_1", "new_date": DAY, "new_time": "11:00"}),
            )
            .await,
        );
        assert_eq!(output["success"], false);
        assert_eq!(output["status"], "not_available");
        let available: Vec<&str> = output["available_times"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap())
            .collect();
        assert!(!available.contains(&"11:00"));
        // The appointment's own slot counts as free
        assert!(available.contains(&"10:00"));
        assert_eq!(available.len(), 15);
        assert_eq!(calendar.writes(), 0);
    }

    #[tokio::test]
    async fn it_reschedules_into_a_free_slot() {
        let calendar = FakeCalendar::with_events(vec![appointment(
            "evt_1",
            "Jansen",
            "jansen@example.com",
            "2030-06-03T10:00:00+02:00",
        )]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "reschedule_appointment",
                json!({"patient_name": "Jansen", "date": DAY, "new_date": "2030-06-04", "new_time": "14:00"}),
            )
            .await,
        );
        assert_eq!(output["success"], true);
        assert_eq!(output["status"], "rescheduled");
        assert_eq!(output["new_start"], "2030-06-04T14:00:00+02:00");
        assert_eq!(output["new_end"], "2030-06-04T14:30:00+02:00");

        let stored = calendar.event("evt_1").unwrap();
        assert_eq!(
            stored.start.date_time.unwrap().to_rfc3339(),
            "2030-06-04T14:00:00+02:00"
        );
        assert_eq!(stored.summary(), "Afspraak - Jansen");
        assert!(
            stored
                .description()
                .ends_with("Verzet: 2030-06-03 10:00 -> 2030-06-04 14:00")
        );
        assert_eq!(calendar.writes(), 1);
    }

    #[tokio::test]
    async fn it_does_not_reschedule_a_cancelled_appointment() {
        let mut cancelled = appointment(
            "evt_1",
            "Jansen",
            "jansen@example.com",
            "2030-06-03T10:00:00+02:00",
        );
        cancelled.summary = Some(String::from("[GEANNULEERD] Afspraak - Jansen"));
        let calendar = FakeCalendar::with_events(vec![cancelled]);
        let app = test_app(calendar.clone());

        let output = tool_output(
            &call_tool(
                &app,
                "reschedule_appointment",
                json!({"event_id": "evt_1", "new_date": DAY, "new_time": "14:00"}),
            )
            .await,
        );
        assert_eq!(output["status"], "appointment_cancelled");
        assert_eq!(calendar.writes(), 0);
    }

    /// Tests calendar failures surface as a generic JSON-RPC error
    #[tokio::test]
    async fn it_hides_calendar_failures() {
        let app = test_app(Arc::new(FailingCalendar));

        let response = call_tool(&app, "check_available_slots", json!({"date": DAY})).await;
        assert_eq!(response["error"]["code"], -32603);
        let message = response["error"]["message"].as_str().unwrap();
        assert!(!message.contains("401"));

        // The server keeps answering
        let response = rpc(&app, "tools/list", json!({})).await;
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 6);
    }
}
