//! End-to-end HTTP tests: routes, status codes, JSON bodies and page caching.

mod common;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use sqlx::PgPool;

use polls::models::answer;
use polls::routes;

use common::{create_poll, page_cache, total_answers};

fn x_cache<B>(res: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
    res.headers()
        .get("X-Cache")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// HTML views
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_root_redirects_to_index(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(page_cache())
            .configure(routes::configure),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap().to_str()?, "/polls/");
    Ok(())
}

#[sqlx::test]
async fn test_index_lists_polls_and_is_cached(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    create_poll(&pool, "Breakfast", 1, 2).await;
    let cache = page_cache();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            .configure(routes::configure),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(x_cache(&res), None);
    let body = String::from_utf8(test::read_body(res).await.to_vec())?;
    assert!(body.contains("Breakfast"));

    // A poll created behind the cache's back is not visible until invalidation.
    create_poll(&pool, "Dinner", 1, 2).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;
    assert_eq!(x_cache(&res).as_deref(), Some("HIT"));
    let body = String::from_utf8(test::read_body(res).await.to_vec())?;
    assert!(!body.contains("Dinner"));

    cache.clear();
    let res = test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;
    let body = String::from_utf8(test::read_body(res).await.to_vec())?;
    assert!(body.contains("Dinner"));
    Ok(())
}

#[sqlx::test]
async fn test_detail_renders_form_fields(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "Detail", 2, 2).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(page_cache())
            .configure(routes::configure),
    )
    .await;

    let uri = format!("/polls/{}/", fx.id);
    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(res).await.to_vec())?;
    for q in &fx.questions {
        assert!(body.contains(&format!("name=\"choice{}\"", q.id)));
        assert!(body.contains(&format!("value=\"{}\"", q.choices[1])));
    }
    assert!(body.contains("class=\"badge\""));
    Ok(())
}

#[sqlx::test]
async fn test_missing_poll_is_404(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(page_cache())
            .configure(routes::configure),
    )
    .await;

    for uri in ["/polls/999/", "/polls/999/results/"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    let req = test::TestRequest::post()
        .uri("/polls/999/vote/")
        .set_form([("choice1", "1")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test]
async fn test_form_vote_redirects_and_clears_cache(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "Vote", 2, 3).await;
    let cache = page_cache();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            .configure(routes::configure),
    )
    .await;

    test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;
    assert_eq!(cache.len(), 1);

    let body = serde_urlencoded::to_string(fx.pick_all(2))?;
    let req = test::TestRequest::post()
        .uri(&format!("/polls/{}/vote/", fx.id))
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap().to_str()?,
        format!("/polls/{}/results/", fx.id)
    );
    assert!(cache.is_empty());
    assert_eq!(total_answers(&pool).await, 2);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/polls/{}/results/", fx.id)).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(res).await.to_vec())?;
    assert!(html.contains("Vote choice 1-3: 1 vote<"));
    assert!(html.contains("Vote choice 1-1: 0 votes"));
    Ok(())
}

#[sqlx::test]
async fn test_form_vote_missing_question_rerenders(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "Missing", 2, 2).await;
    let cache = page_cache();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            .configure(routes::configure),
    )
    .await;

    let q1 = &fx.questions[0];
    let req = test::TestRequest::post()
        .uri(&format!("/polls/{}/vote/", fx.id))
        .set_form([(format!("choice{}", q1.id), q1.choices[1].to_string())])
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(res).await.to_vec())?;
    assert!(html.contains("You didn"));
    assert!(html.contains(&fx.questions[1].text));
    assert!(html.contains(&format!("value=\"{}\" checked", q1.choices[1])));
    assert_eq!(total_answers(&pool).await, 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn test_api_vote_success(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "ApiOk", 2, 2).await;
    let cache = page_cache();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(cache.clone())
            .configure(routes::configure),
    )
    .await;
    test::call_service(&app, test::TestRequest::get().uri("/polls/").to_request()).await;

    let payload = json!({
        format!("choice{}", fx.questions[0].id): fx.questions[0].choices[0],
        format!("choice{}", fx.questions[1].id): fx.questions[1].choices[1].to_string(),
    });
    let req = test::TestRequest::post()
        .uri(&format!("/polls/api/{}/vote/", fx.id))
        .set_json(&payload)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["success"], "Votes added");
    assert_eq!(body["answers"].as_array().unwrap().len(), 2);
    assert_eq!(body["answers"][1]["choice"], fx.questions[1].choices[1]);
    assert!(cache.is_empty());
    assert_eq!(total_answers(&pool).await, 2);
    Ok(())
}

#[sqlx::test]
async fn test_api_vote_errors(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "ApiErr", 2, 2).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(page_cache())
            .configure(routes::configure),
    )
    .await;
    let uri = format!("/polls/api/{}/vote/", fx.id);
    let q1 = &fx.questions[0];
    let q2 = &fx.questions[1];

    let cases = [
        (
            json!({ format!("choice{}", q1.id): q1.choices[0], format!("choice{}", q2.id): 999_999 }),
            "Invalid question or choice",
        ),
        (json!({ format!("choice{}", q1.id): q1.choices[0] }), "Please answer all questions"),
        (json!({ "other": 1, format!("choice{}", q1.id): "" }), "No valid votes submitted"),
        (json!({ "choicefoo": 1 }), "Invalid question or choice"),
    ];

    for (payload, expected) in cases {
        let req = test::TestRequest::post().uri(&uri).set_json(&payload).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], expected, "{payload}");
    }
    assert_eq!(total_answers(&pool).await, 0);

    // Form-encoded bodies are refused on the API.
    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([(format!("choice{}", q1.id), q1.choices[0].to_string())])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Votes must be sent as application/json");

    // Unknown poll.
    let req = test::TestRequest::post()
        .uri("/polls/api/999999/vote/")
        .set_json(json!({}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Poll not found");
    Ok(())
}

#[sqlx::test]
async fn test_api_results_detail(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let fx = create_poll(&pool, "ApiDetail", 2, 2).await;
    answer::create(&pool, fx.questions[0].choices[1]).await?;
    answer::create(&pool, fx.questions[0].choices[1]).await?;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(page_cache())
            .configure(routes::configure),
    )
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/polls/api/{}/results/", fx.id)).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["id"], fx.id);
    assert_eq!(body["poll_name"], "ApiDetail");
    assert!(body["created_at"].is_string());
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["id"], fx.questions[0].id);
    assert!(questions[0]["pub_date"].is_string());
    assert_eq!(questions[0]["choices"][1]["num_answers"], 2);
    assert_eq!(questions[0]["choices"][0]["num_answers"], 0);
    assert!(questions[0]["choices"][1].get("answers").is_none());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/polls/api/{}/results/?include_answers=true", fx.id))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    let answers = body["questions"][0]["choices"][1]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["choice"], fx.questions[0].choices[1]);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/polls/api/999999/results/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
