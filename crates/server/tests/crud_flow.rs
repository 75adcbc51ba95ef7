use std::net::SocketAddr;

use configs::{AppConfig, RESERVATIONS_SERVICE};
use httpmock::prelude::*;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const NOT_FOUND_MSG: &str = "No se encontró información asociada con el identificador ingresado";
const ID_MSG: &str = "Violación de restricción: id: El Id debe ser un entero positivo";

struct TestApp {
    base_url: String,
}

/// Start the full app on an ephemeral port; `reservations` is the base URL of `ms-reservas`.
async fn start_server(reservations: Option<String>) -> anyhow::Result<TestApp> {
    let mut cfg = AppConfig::default();
    if let Some(url) = reservations {
        cfg.remote.services.insert(RESERVATIONS_SERVICE.to_string(), url);
    }
    cfg.remote.request_timeout_secs = 2;

    let app = server::startup::build_app(&cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn closed_port_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("ephemeral port")
        .port();
    format!("http://127.0.0.1:{port}")
}

fn room(number: &str) -> Value {
    json!({"number": number, "kind": "Doble", "price": 1450.0, "capacity": 2})
}

fn guest() -> Value {
    json!({"name": "Ana López", "email": "ana@hotel.mx", "phone": "5512345678"})
}

async fn envelope(res: reqwest::Response) -> anyhow::Result<(u16, Value)> {
    let status = res.status().as_u16();
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], status, "envelope code mirrors HTTP status");
    Ok((status, body))
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_create_then_get_and_list() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();

    let res = c.post(format!("{}/rooms", app.base_url)).json(&room("101")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created = res.json::<Value>().await?;
    let id = created["id"].as_i64().expect("server-assigned id");
    assert!(id > 0);
    assert_eq!(created["number"], "101");
    assert!(created["created_at"].is_string());

    let fetched = c.get(format!("{}/rooms/{id}", app.base_url)).send().await?.json::<Value>().await?;
    assert_eq!(fetched, created);

    c.post(format!("{}/rooms", app.base_url)).json(&room("102")).send().await?;
    let first = c.get(format!("{}/rooms", app.base_url)).send().await?.json::<Value>().await?;
    let second = c.get(format!("{}/rooms", app.base_url)).send().await?.json::<Value>().await?;
    assert_eq!(first, second);
    assert_eq!(first.as_array().map(Vec::len), Some(2));
    assert_eq!(first[0]["number"], "101");
    Ok(())
}

#[tokio::test]
async fn e2e_list_empty_is_ok() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let res = reqwest::get(format!("{}/guests", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn e2e_non_positive_ids_rejected() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();
    for raw in ["0", "-3", "abc"] {
        let (status, body) = envelope(c.get(format!("{}/rooms/{raw}", app.base_url)).send().await?).await?;
        assert_eq!(status, 400, "{raw}");
        assert_eq!(body["response"], ID_MSG);

        let res = c.put(format!("{}/guests/{raw}", app.base_url)).json(&guest()).send().await?;
        assert_eq!(envelope(res).await?.0, 400);

        let res = c.delete(format!("{}/guests/{raw}", app.base_url)).send().await?;
        assert_eq!(envelope(res).await?.0, 400);
    }
    Ok(())
}

#[tokio::test]
async fn e2e_missing_resource_is_404_with_fixed_message() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();

    let (status, body) = envelope(c.get(format!("{}/guests/999", app.base_url)).send().await?).await?;
    assert_eq!(status, 404);
    assert_eq!(body["response"], NOT_FOUND_MSG);

    let res = c.put(format!("{}/guests/999", app.base_url)).json(&guest()).send().await?;
    let (status, body) = envelope(res).await?;
    assert_eq!(status, 404);
    assert_eq!(body["response"], NOT_FOUND_MSG);

    // checked locally before the reservations service is consulted
    let (status, _) = envelope(c.delete(format!("{}/rooms/999", app.base_url)).send().await?).await?;
    assert_eq!(status, 404);
    Ok(())
}

#[tokio::test]
async fn e2e_validation_reports_first_field() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();

    let bad = json!({"name": "Ana", "email": "not-an-email", "phone": "12"});
    let (status, body) = envelope(c.post(format!("{}/guests", app.base_url)).json(&bad).send().await?).await?;
    assert_eq!(status, 400);
    assert_eq!(body["response"], "email: debe ser una dirección de correo válida");

    let res = c
        .post(format!("{}/guests", app.base_url))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await?;
    let (status, body) = envelope(res).await?;
    assert_eq!(status, 400);
    assert_eq!(body["response"], "Error de validación en los datos enviados");

    // nothing was stored
    let list = c.get(format!("{}/guests", app.base_url)).send().await?.json::<Value>().await?;
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn e2e_update_replaces_fields() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();
    let created = c.post(format!("{}/guests", app.base_url)).json(&guest()).send().await?.json::<Value>().await?;
    let id = created["id"].as_i64().expect("id");

    let changed = json!({"name": "Ana María López", "email": "ana.maria@hotel.mx", "phone": "5587654321"});
    let res = c.put(format!("{}/guests/{id}", app.base_url)).json(&changed).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["name"], "Ana María López");
    assert_eq!(updated["created_at"], created["created_at"]);

    let invalid = json!({"name": "", "email": "ana@hotel.mx", "phone": "5587654321"});
    let (status, body) = envelope(c.put(format!("{}/guests/{id}", app.base_url)).json(&invalid).send().await?).await?;
    assert_eq!(status, 400);
    assert_eq!(body["response"], "name: no debe estar vacío");
    Ok(())
}

#[tokio::test]
async fn e2e_delete_unreferenced_returns_removed() -> anyhow::Result<()> {
    let remote = MockServer::start_async().await;
    let check = remote
        .mock_async(|when, then| {
            when.method(GET).path("/id-huesped/1");
            then.status(200).json_body(json!(false));
        })
        .await;
    let app = start_server(Some(remote.base_url())).await?;
    let c = reqwest::Client::new();

    let created = c.post(format!("{}/guests", app.base_url)).json(&guest()).send().await?.json::<Value>().await?;
    let res = c.delete(format!("{}/guests/1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?, created);
    check.assert_async().await;

    let (status, _) = envelope(c.get(format!("{}/guests/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 404);
    Ok(())
}

#[tokio::test]
async fn e2e_delete_referenced_is_conflict() -> anyhow::Result<()> {
    let remote = MockServer::start_async().await;
    remote
        .mock_async(|when, then| {
            when.method(GET).path("/id-habitacion/1");
            then.status(200).json_body(json!(true));
        })
        .await;
    let app = start_server(Some(remote.base_url())).await?;
    let c = reqwest::Client::new();

    c.post(format!("{}/rooms", app.base_url)).json(&room("301")).send().await?;
    let (status, body) = envelope(c.delete(format!("{}/rooms/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 409);
    assert_eq!(body["response"], "No se puede eliminar la habitación 1 porque tiene reservaciones asociadas");

    let reserved = c.get(format!("{}/rooms/1/reserved", app.base_url)).send().await?.json::<Value>().await?;
    assert_eq!(reserved, json!({"id": 1, "reserved": true}));
    Ok(())
}

#[tokio::test]
async fn e2e_remote_404_is_mirrored() -> anyhow::Result<()> {
    let remote = MockServer::start_async().await;
    remote
        .mock_async(|when, then| {
            when.method(GET).path("/id-huesped/1");
            then.status(404);
        })
        .await;
    let app = start_server(Some(remote.base_url())).await?;
    let c = reqwest::Client::new();

    c.post(format!("{}/guests", app.base_url)).json(&guest()).send().await?;
    let (status, body) = envelope(c.delete(format!("{}/guests/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 404);
    assert_eq!(body["response"], "Recurso no encontrado en el servicio remoto.");
    Ok(())
}

#[tokio::test]
async fn e2e_remote_down_is_503() -> anyhow::Result<()> {
    let app = start_server(Some(closed_port_url())).await?;
    let c = reqwest::Client::new();

    c.post(format!("{}/rooms", app.base_url)).json(&room("401")).send().await?;
    let (status, body) = envelope(c.delete(format!("{}/rooms/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 503);
    assert_eq!(body["response"], "El servicio remoto no está disponible o no responde en este momento.");

    // the room survives a failed delete
    let res = c.get(format!("{}/rooms/1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_remote_timeout_is_503() -> anyhow::Result<()> {
    let remote = MockServer::start_async().await;
    remote
        .mock_async(|when, then| {
            when.method(GET).path("/id-huesped/1");
            then.status(200).json_body(json!(false)).delay(std::time::Duration::from_secs(5));
        })
        .await;
    let app = start_server(Some(remote.base_url())).await?;
    let c = reqwest::Client::new();

    c.post(format!("{}/guests", app.base_url)).json(&guest()).send().await?;
    let (status, body) = envelope(c.delete(format!("{}/guests/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 503);
    assert_eq!(body["response"], "El servicio remoto no está disponible o no responde en este momento.");

    let res = c.get(format!("{}/guests/1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_unknown_route_and_method_are_enveloped() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let c = reqwest::Client::new();

    let (status, body) = envelope(c.get(format!("{}/payments", app.base_url)).send().await?).await?;
    assert_eq!(status, 404);
    assert_eq!(body["response"], NOT_FOUND_MSG);

    let (status, _) = envelope(c.post(format!("{}/rooms/1", app.base_url)).send().await?).await?;
    assert_eq!(status, 500);
    Ok(())
}

#[tokio::test]
async fn e2e_unregistered_remote_is_503() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let (status, _) = envelope(reqwest::get(format!("{}/guests/5/reserved", app.base_url)).await?).await?;
    assert_eq!(status, 503);
    Ok(())
}

#[tokio::test]
async fn e2e_metrics_count_normalized_errors() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    reqwest::get(format!("{}/rooms/0", app.base_url)).await?;
    let res = reqwest::get(format!("{}/metrics", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let text = res.text().await?;
    assert!(text.contains("commons_errors_total{kind=\"constraint_violation\"}"), "{text}");
    Ok(())
}
