use crate::auth::{AuthState, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Splash,
    Login,
    FarmerHome,
    HighLevelHome,
    Marketplace,
    Community,
    Auctions,
    Transfers,
    VetConsultation,
    ActivityVerification,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Splash => "splash",
            Route::Login => "login",
            Route::FarmerHome => "farmer_home",
            Route::HighLevelHome => "high_level_home",
            Route::Marketplace => "marketplace",
            Route::Community => "community",
            Route::Auctions => "auctions",
            Route::Transfers => "transfers",
            Route::VetConsultation => "vet_consultation",
            Route::ActivityVerification => "activity_verification",
            Route::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
}

const fn item(route: Route, label: &'static str) -> NavItem {
    NavItem { route, label }
}

pub fn start_destination(state: &AuthState) -> Route {
    match state {
        AuthState::Loading => Route::Splash,
        AuthState::Unauthenticated | AuthState::Error(_) => Route::Login,
        AuthState::Authenticated(user) => home_route(user.role),
    }
}

pub fn home_route(role: UserRole) -> Route {
    match role {
        UserRole::Farmer => Route::FarmerHome,
        UserRole::Buyer => Route::Marketplace,
        UserRole::Admin => Route::HighLevelHome,
        UserRole::Veterinarian => Route::VetConsultation,
        UserRole::Expert => Route::Community,
    }
}

pub fn bottom_navigation(role: UserRole) -> Vec<NavItem> {
    match role {
        UserRole::Farmer => vec![
            item(Route::FarmerHome, "Home"),
            item(Route::Marketplace, "Market"),
            item(Route::Community, "Community"),
            item(Route::Transfers, "Transfers"),
            item(Route::Profile, "Profile"),
        ],
        UserRole::Buyer => vec![
            item(Route::Marketplace, "Market"),
            item(Route::Community, "Community"),
            item(Route::Auctions, "Auctions"),
            item(Route::Transfers, "My Orders"),
            item(Route::Profile, "Profile"),
        ],
        UserRole::Admin => vec![
            item(Route::HighLevelHome, "Dashboard"),
            item(Route::Marketplace, "Market"),
            item(Route::ActivityVerification, "Verification"),
            item(Route::Transfers, "Transfers"),
            item(Route::Profile, "Profile"),
        ],
        UserRole::Veterinarian => vec![
            item(Route::VetConsultation, "Consultations"),
            item(Route::Community, "Community"),
            item(Route::Marketplace, "Market"),
            item(Route::Profile, "Profile"),
        ],
        UserRole::Expert => vec![
            item(Route::Community, "Community"),
            item(Route::Marketplace, "Market"),
            item(Route::Profile, "Profile"),
        ],
    }
}
