#[rocket::launch]
fn rocket() -> _ {
    let rocket = campaign_server::rocket();
    log::info!("starting campaign server");
    rocket
}
