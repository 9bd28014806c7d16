use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::get().uri(path).to_request();
    send(req, configure).await
}

pub async fn put_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::put().uri(path).to_request();
    send(req, configure).await
}

// Errors come back as real responses (ServerError implements ResponseError), so there is no Err
// branch to handle here.
async fn send(req: actix_http::Request, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::call_service(&service, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
