use crate::{error::Result, info, service::SpotifyService, success, types::UserProfile, warning};

pub async fn login(service: &SpotifyService) -> Result<()> {
    let profile = service.login().await?;
    success!("Authentication successful!");
    print_profile(&profile);
    Ok(())
}

pub async fn logout(service: &SpotifyService) {
    service.logout().await;
    success!("Logged out.");
}

pub async fn status(service: &SpotifyService) {
    if !service.is_configured() {
        warning!("Spotify credentials are not configured. See .env.example in the data directory.");
        return;
    }
    info!("Spotify credentials are configured.");

    if service.is_authenticated().await {
        success!("Logged in.");
    } else {
        warning!("Not logged in. Run `yfitops login`.");
    }
}

pub async fn whoami(service: &SpotifyService) -> Result<()> {
    let profile = service.get_current_user().await?;
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    info!(
        "{} ({})",
        profile.display_name.as_deref().unwrap_or(&profile.id),
        profile.id
    );
    if let Some(email) = &profile.email {
        info!("Email: {}", email);
    }
    if let Some(product) = &profile.product {
        info!("Plan: {}", product);
    }
}
