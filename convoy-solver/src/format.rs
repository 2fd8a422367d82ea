//! Conversion of internal routes into the public [`Solution`] shape.

use convoy_core::{RouteResult, Solution, Stop, StopAction};

use crate::model::{Model, Role};
use crate::route::Route;

/// One [`RouteResult`] per vehicle, in vehicle order.
pub(crate) fn to_solution(model: &Model, routes: &[Route]) -> Solution {
    Solution::found(routes.iter().map(|route| to_result(model, route)).collect())
}

fn to_result(model: &Model, route: &Route) -> RouteResult {
    let last = route.visits().len();
    let stops = route
        .sequence()
        .enumerate()
        .map(|(idx, node)| Stop {
            node,
            // The end terminal reports the arriving load.
            load: route
                .load_after(idx.min(last))
                .unwrap_or_default(),
            action: action(model.role(node)),
        })
        .collect();
    RouteResult::new(
        route.vehicle(),
        stops,
        u64::try_from(route.distance()).unwrap_or_default(),
    )
}

const fn action(role: Role) -> StopAction {
    match role {
        Role::Pickup { .. } => StopAction::Pickup,
        Role::Delivery { .. } => StopAction::Delivery,
        Role::Terminal | Role::Single => StopAction::Visit,
    }
}
