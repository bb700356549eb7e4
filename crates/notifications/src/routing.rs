use model::notification::{NotificationData, NotificationKind};

pub const HOME: &str = "/";

/// The page of the admin app a notification leads to.
pub fn target_route(data: Option<&NotificationData>) -> String {
    let Some(data) = data else {
        return HOME.to_owned();
    };

    match data.notification_kind() {
        Some(NotificationKind::QuotaReached) => with_id("/driver", &data.driver_id),
        Some(NotificationKind::CapacityOvercrowded) => "/fleet-management".to_owned(),
        Some(NotificationKind::RouteChanged) => with_id("/routes", &data.route_id),
        Some(NotificationKind::HeavyRainAlert) => "/weather-alerts".to_owned(),
        _ => HOME.to_owned(),
    }
}

// Detail pages need an id, without one there is nothing to show.
fn with_id(prefix: &str, id: &Option<String>) -> String {
    match id {
        Some(id) => format!("{}/{}", prefix, id),
        None => HOME.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table() {
        let quota = NotificationData {
            driver_id: Some("17".to_owned()),
            ..NotificationData::of_kind("quota_reached")
        };
        let route = NotificationData {
            route_id: Some("4".to_owned()),
            ..NotificationData::of_kind("route_changed")
        };

        assert_eq!(target_route(Some(&quota)), "/driver/17");
        assert_eq!(
            target_route(Some(&NotificationData::of_kind("capacity_overcrowded"))),
            "/fleet-management"
        );
        assert_eq!(target_route(Some(&route)), "/routes/4");
        assert_eq!(
            target_route(Some(&NotificationData::of_kind("heavy_rain_alert"))),
            "/weather-alerts"
        );
    }

    #[test]
    fn everything_else_goes_home() {
        assert_eq!(target_route(None), HOME);
        assert_eq!(target_route(Some(&NotificationData::default())), HOME);
        assert_eq!(target_route(Some(&NotificationData::of_kind("urgent"))), HOME);
        assert_eq!(target_route(Some(&NotificationData::of_kind("party"))), HOME);
        assert_eq!(
            target_route(Some(&NotificationData::of_kind("quota_reached"))),
            HOME
        );
    }
}
