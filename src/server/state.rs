use crate::intel::IntelResolver;

pub struct AppState {
    pub resolver: IntelResolver,
}
