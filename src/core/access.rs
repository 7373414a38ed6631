use crate::model::role::Role;

/// Requesting principal, as established by the identity layer.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub id: u64,
    pub role: Role,
}

/// The user whose records are being read or mutated.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub id: u64,
    pub role: Role,
    pub manager_id: Option<u64>,
}

/// Visibility class a role gets over a record category. Used both as a
/// predicate and to shape list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Everything except Admin and Sub-Admin records.
    ExceptPrivileged,
    /// Everything except Admin records.
    ExceptAdmin,
    /// The viewer's own records plus direct reports.
    OwnAndReports,
    Own,
}

impl Scope {
    pub fn permits(self, viewer: Viewer, target: Target) -> bool {
        match self {
            Scope::All => true,
            Scope::ExceptPrivileged => !target.role.is_privileged() || target.id == viewer.id,
            Scope::ExceptAdmin => target.role != Role::Admin || target.id == viewer.id,
            Scope::OwnAndReports => {
                target.id == viewer.id || target.manager_id == Some(viewer.id)
            }
            Scope::Own => target.id == viewer.id,
        }
    }
}

/// Attendance visibility (also governs leave-record visibility; leave
/// *approval* is the separate `leave_policy::can_approve` matrix).
pub fn attendance_scope(role: Role) -> Scope {
    match role {
        Role::Admin | Role::SubAdmin => Scope::All,
        Role::Hr => Scope::ExceptPrivileged,
        Role::TeamLead => Scope::OwnAndReports,
        Role::Employee => Scope::Own,
    }
}

pub fn payroll_scope(role: Role) -> Scope {
    match role {
        Role::Admin => Scope::All,
        Role::SubAdmin => Scope::ExceptAdmin,
        Role::Hr => Scope::ExceptPrivileged,
        Role::TeamLead | Role::Employee => Scope::Own,
    }
}

pub fn can_view_attendance(viewer: Viewer, target: Target) -> bool {
    attendance_scope(viewer.role).permits(viewer, target)
}

pub fn can_view_payroll(viewer: Viewer, target: Target) -> bool {
    payroll_scope(viewer.role).permits(viewer, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(id: u64, role: Role) -> Viewer {
        Viewer { id, role }
    }

    fn target(id: u64, role: Role, manager_id: Option<u64>) -> Target {
        Target { id, role, manager_id }
    }

    #[test]
    fn admin_and_sub_admin_see_all_attendance() {
        let t = target(9, Role::Admin, None);
        assert!(can_view_attendance(viewer(1, Role::Admin), t));
        assert!(can_view_attendance(viewer(2, Role::SubAdmin), t));
    }

    #[test]
    fn hr_attendance_excludes_privileged_roles() {
        let hr = viewer(3, Role::Hr);
        assert!(!can_view_attendance(hr, target(1, Role::Admin, None)));
        assert!(!can_view_attendance(hr, target(2, Role::SubAdmin, None)));
        assert!(can_view_attendance(hr, target(4, Role::TeamLead, None)));
        assert!(can_view_attendance(hr, target(5, Role::Employee, None)));
        // Own records are always visible.
        assert!(can_view_attendance(hr, target(3, Role::Hr, None)));
    }

    #[test]
    fn team_lead_sees_own_and_direct_reports() {
        let lead = viewer(4, Role::TeamLead);
        assert!(can_view_attendance(lead, target(4, Role::TeamLead, None)));
        assert!(can_view_attendance(lead, target(5, Role::Employee, Some(4))));
        assert!(!can_view_attendance(lead, target(6, Role::Employee, Some(7))));
        assert!(!can_view_attendance(lead, target(6, Role::Employee, None)));
    }

    #[test]
    fn employee_sees_only_own() {
        let emp = viewer(5, Role::Employee);
        assert!(can_view_attendance(emp, target(5, Role::Employee, None)));
        assert!(!can_view_attendance(emp, target(6, Role::Employee, Some(5))));
        assert!(!can_view_payroll(emp, target(6, Role::Employee, None)));
        assert!(can_view_payroll(emp, target(5, Role::Employee, None)));
    }

    #[test]
    fn sub_admin_payroll_excludes_admin_only() {
        let sub = viewer(2, Role::SubAdmin);
        assert!(!can_view_payroll(sub, target(1, Role::Admin, None)));
        assert!(can_view_payroll(sub, target(3, Role::Hr, None)));
        assert!(can_view_payroll(sub, target(5, Role::Employee, None)));
    }

    #[test]
    fn team_lead_payroll_is_own_only() {
        let lead = viewer(4, Role::TeamLead);
        assert!(can_view_payroll(lead, target(4, Role::TeamLead, None)));
        // Direct reports' payroll stays hidden even though attendance is not.
        assert!(!can_view_payroll(lead, target(5, Role::Employee, Some(4))));
    }
}
