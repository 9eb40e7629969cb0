use actix_web::{HttpResponse, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{AppState, TransferRequest, ValidateResponse};
use crate::error::{ApiError, ChainError};

/// Get the full blockchain.
#[get("/blockchain")]
pub async fn get_chain(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bc = state.blockchain.lock()?;
    Ok(HttpResponse::Ok().json(&*bc))
}

/// Validate the whole chain.
#[get("/blockchain/validate")]
pub async fn validate_chain(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bc = state.blockchain.lock()?;
    Ok(HttpResponse::Ok().json(ValidateResponse {
        valid: bc.is_valid(),
        length: bc.len(),
        difficulty: bc.difficulty(),
    }))
}

/// Append a transfer block and return the updated chain.
///
/// The lock is held only to snapshot the tail and to push; PoW runs on the
/// blocking pool without it. If another append lands meanwhile, the block is
/// rebuilt on the new tail and mined again.
#[post("/blockchain/add")]
pub async fn add_block(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let t0 = Instant::now();
    let req = TransferRequest::parse(&body).inspect_err(|e| {
        warn!("POST /blockchain/add - rejected: {e}");
    })?;

    let snapshot = loop {
        let (mut block, difficulty) = {
            let bc = state.blockchain.lock()?;
            (bc.next_block(&req.from, &req.to, req.amount), bc.difficulty())
        };

        let block = web::block(move || {
            block.mine(difficulty);
            block
        })
        .await?;

        let mut bc = state.blockchain.lock()?;
        match bc.append_mined_block(block) {
            Ok(()) => break bc.clone(),
            Err(ChainError::StaleTip) => debug!("POST /blockchain/add - tip moved, mining again"),
            Err(e) => return Err(e.into()),
        }
    };

    info!(
        "POST /blockchain/add - height {} ({} ms)",
        snapshot.len(),
        t0.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(snapshot))
}

#[cfg(test)]
mod tests {
    use crate::api::{AppState, init_routes};
    use crate::blockchain::Block;
    use actix_web::http::StatusCode;
    use actix_web::{App, rt, test, web};
    use serde_json::Value;
    use std::rc::Rc;
    use std::time::Duration;

    macro_rules! app {
        ($difficulty:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new($difficulty)))
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn get_returns_genesis_only_chain() {
        let app = app!(2);
        let req = test::TestRequest::get().uri("/blockchain").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(json["difficulty"], 2);
        assert_eq!(json["chain"].as_array().unwrap().len(), 1);
        assert_eq!(json["genesis_block"]["hash"], "0");
        assert_eq!(json["genesis_block"]["pow"], 0);
        assert!(json["genesis_block"]["timestamp"].is_string());
        assert!(json["genesis_block"]["data"].is_object());
    }

    #[actix_web::test]
    async fn add_then_get_round_trip() {
        let app = app!(2);
        let req = test::TestRequest::post()
            .uri("/blockchain/add")
            .set_json(serde_json::json!({ "from": "alice", "to": "bob", "amount": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let added: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(added["chain"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/blockchain").to_request();
        let body = test::read_body(test::call_service(&app, req).await).await;
        let json: Value = serde_json::from_slice(&body).unwrap();

        let chain = json["chain"].as_array().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain[1]["data"],
            serde_json::json!({ "from": "alice", "to": "bob", "amount": 10 })
        );
        assert!(chain[1]["hash"].as_str().unwrap().starts_with("00"));
        assert_eq!(chain[1]["previous_hash"], json["genesis_block"]["hash"]);
        assert_eq!(chain[1]["previous_hash"], "0");

        // The wire form carries enough to re-verify every block.
        let blocks: Vec<Block> = serde_json::from_value(json["chain"].clone()).unwrap();
        assert!(blocks[1].has_valid_hash());
        assert_eq!(blocks[1].previous_hash, blocks[0].hash);
    }

    #[actix_web::test]
    async fn validate_reports_chain_state() {
        let app = app!(1);
        for amount in [1, 2] {
            let req = test::TestRequest::post()
                .uri("/blockchain/add")
                .set_json(serde_json::json!({ "from": "a", "to": "b", "amount": amount }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/blockchain/validate")
            .to_request();
        let json: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json["valid"], true);
        assert_eq!(json["length"], 3);
        assert_eq!(json["difficulty"], 1);
    }

    #[actix_web::test]
    async fn missing_field_is_named() {
        let app = app!(1);
        let req = test::TestRequest::post()
            .uri("/blockchain/add")
            .set_json(serde_json::json!({ "from": "alice", "amount": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(resp).await;
        assert_eq!(std::str::from_utf8(&body).unwrap(), "Invalid 'to' field");
    }

    #[actix_web::test]
    async fn wrong_typed_amount_is_rejected() {
        let app = app!(1);
        let req = test::TestRequest::post()
            .uri("/blockchain/add")
            .set_json(serde_json::json!({ "from": "a", "to": "b", "amount": "ten" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("'amount'"));
    }

    #[actix_web::test]
    async fn malformed_body_is_bad_request() {
        let app = app!(1);
        let req = test::TestRequest::post()
            .uri("/blockchain/add")
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!test::read_body(resp).await.is_empty());

        // Rejected requests leave the chain untouched.
        let req = test::TestRequest::get().uri("/blockchain").to_request();
        let json: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json["chain"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn health_is_up() {
        let app = app!(1);
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn readers_are_served_while_a_block_is_mined() {
        let app = Rc::new(app!(5));
        let miner = {
            let app = Rc::clone(&app);
            rt::spawn(async move {
                let req = test::TestRequest::post()
                    .uri("/blockchain/add")
                    .set_json(serde_json::json!({ "from": "alice", "to": "bob", "amount": 1 }))
                    .to_request();
                test::call_service(&*app, req).await.status()
            })
        };
        // Let the append reach the blocking pool.
        rt::time::sleep(Duration::from_millis(20)).await;

        let req = test::TestRequest::get().uri("/blockchain").to_request();
        let json: Value = test::call_and_read_body_json(&*app, req).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let health = test::call_service(&*app, req).await.status();

        // Unless mining already finished, the readers got the pre-append chain.
        if !miner.is_finished() {
            assert_eq!(json["chain"].as_array().unwrap().len(), 1);
        }
        assert_eq!(health, StatusCode::OK);

        assert_eq!(miner.await.unwrap(), StatusCode::OK);
        let req = test::TestRequest::get().uri("/blockchain").to_request();
        let json: Value = test::call_and_read_body_json(&*app, req).await;
        assert_eq!(json["chain"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn concurrent_posts_all_land_on_a_linked_chain() {
        let app = Rc::new(app!(2));
        let posts: Vec<_> = (0..4)
            .map(|i| {
                let app = Rc::clone(&app);
                rt::spawn(async move {
                    let req = test::TestRequest::post()
                        .uri("/blockchain/add")
                        .set_json(serde_json::json!({ "from": "a", "to": "b", "amount": i }))
                        .to_request();
                    test::call_service(&*app, req).await.status()
                })
            })
            .collect();
        for post in posts {
            assert_eq!(post.await.unwrap(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/blockchain/validate")
            .to_request();
        let json: Value = test::call_and_read_body_json(&*app, req).await;
        assert_eq!(json["valid"], true);
        assert_eq!(json["length"], 5);
    }
}
